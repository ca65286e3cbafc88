pub mod payment_handler;

pub use payment_handler::{
    __path_create_payment, __path_get_payment, __path_list_payments, __path_payment_webhook,
    create_payment, get_payment, list_payments, payment_webhook,
};
