pub mod dag_dto;
pub mod engine_config_dto;
