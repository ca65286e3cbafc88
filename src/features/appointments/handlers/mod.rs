pub mod appointment_handler;

pub use appointment_handler::{
    __path_create_appointment, __path_get_appointment, __path_list_appointments,
    __path_update_appointment_status, create_appointment, get_appointment, list_appointments,
    update_appointment_status,
};
