pub mod psychologist_handler;

pub use psychologist_handler::{
    __path_create_profile, __path_get_own_profile, __path_get_psychologist,
    __path_search_psychologists, __path_update_profile, create_profile, get_own_profile,
    get_psychologist, search_psychologists, update_profile,
};
