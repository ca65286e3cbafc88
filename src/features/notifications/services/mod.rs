pub mod mailer_service;

pub use mailer_service::MailerService;
