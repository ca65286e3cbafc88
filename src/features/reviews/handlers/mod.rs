pub mod review_handler;

pub use review_handler::{
    __path_create_review, __path_delete_review, __path_list_psychologist_reviews, create_review,
    delete_review, list_psychologist_reviews,
};
