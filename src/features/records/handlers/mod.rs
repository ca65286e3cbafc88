pub mod record_handler;

pub use record_handler::{
    __path_create_record, __path_get_record, __path_list_records, __path_update_record,
    create_record, get_record, list_records, update_record,
};
