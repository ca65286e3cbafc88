pub mod admin_handler;

pub use admin_handler::{
    __path_get_overview, __path_list_psychologists, __path_list_users,
    __path_update_user_status, __path_verify_psychologist, get_overview, list_psychologists,
    list_users, update_user_status, verify_psychologist,
};
