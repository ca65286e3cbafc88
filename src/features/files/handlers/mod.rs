pub mod file_handler;

pub use file_handler::{__path_delete_file, __path_upload_image, delete_file, upload_image};
