pub mod contract;
pub mod db_init;
