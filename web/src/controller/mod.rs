pub mod health_check_controller;
