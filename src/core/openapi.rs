use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::appointments::{
    dtos as appointments_dtos, handlers as appointments_handlers, models as appointments_models,
};
use crate::features::auth::{self, models as auth_models};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::payments::{
    dtos as payments_dtos, handlers as payments_handlers, models as payments_models,
};
use crate::features::psychologists::{
    dtos as psychologists_dtos, handlers as psychologists_handlers,
};
use crate::features::records::{dtos as records_dtos, handlers as records_handlers};
use crate::features::reviews::{dtos as reviews_dtos, handlers as reviews_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::pagination::{PageMeta, Paginated};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        auth::handlers::change_password,
        // Users
        users_handlers::get_user,
        users_handlers::update_user,
        users_handlers::list_users,
        // Psychologists
        psychologists_handlers::create_profile,
        psychologists_handlers::get_own_profile,
        psychologists_handlers::update_profile,
        psychologists_handlers::search_psychologists,
        psychologists_handlers::get_psychologist,
        // Appointments
        appointments_handlers::create_appointment,
        appointments_handlers::list_appointments,
        appointments_handlers::get_appointment,
        appointments_handlers::update_appointment_status,
        // Payments
        payments_handlers::create_payment,
        payments_handlers::list_payments,
        payments_handlers::get_payment,
        payments_handlers::payment_webhook,
        // Reviews
        reviews_handlers::create_review,
        reviews_handlers::list_psychologist_reviews,
        reviews_handlers::delete_review,
        // Clinical records
        records_handlers::create_record,
        records_handlers::list_records,
        records_handlers::get_record,
        records_handlers::update_record,
        // Files
        files_handlers::upload_image,
        files_handlers::delete_file,
        // Admin
        admin_handlers::list_users,
        admin_handlers::update_user_status,
        admin_handlers::list_psychologists,
        admin_handlers::verify_psychologist,
        admin_handlers::get_overview,
    ),
    components(
        schemas(
            // Shared
            PageMeta,
            auth_models::Role,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::ChangePasswordRequestDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::AuthUserDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            // Users
            users_dtos::UserDto,
            users_dtos::UpdateUserDto,
            ApiResponse<users_dtos::UserDto>,
            Paginated<users_dtos::UserDto>,
            // Psychologists
            psychologists_dtos::CreateProfileDto,
            psychologists_dtos::UpdateProfileDto,
            psychologists_dtos::PsychologistProfileDto,
            ApiResponse<psychologists_dtos::PsychologistProfileDto>,
            Paginated<psychologists_dtos::PsychologistProfileDto>,
            // Appointments
            appointments_models::AppointmentStatus,
            appointments_dtos::CreateAppointmentDto,
            appointments_dtos::UpdateAppointmentStatusDto,
            appointments_dtos::AppointmentDto,
            ApiResponse<appointments_dtos::AppointmentDto>,
            Paginated<appointments_dtos::AppointmentDto>,
            // Payments
            payments_models::PaymentStatus,
            payments_dtos::CreatePaymentDto,
            payments_dtos::WebhookEventDto,
            payments_dtos::PaymentDto,
            ApiResponse<payments_dtos::PaymentDto>,
            Paginated<payments_dtos::PaymentDto>,
            // Reviews
            reviews_dtos::CreateReviewDto,
            reviews_dtos::ReviewDto,
            ApiResponse<reviews_dtos::ReviewDto>,
            Paginated<reviews_dtos::ReviewDto>,
            // Clinical records
            records_dtos::CreateRecordDto,
            records_dtos::UpdateRecordDto,
            records_dtos::RecordDto,
            ApiResponse<records_dtos::RecordDto>,
            Paginated<records_dtos::RecordDto>,
            // Files
            files_dtos::UploadImageForm,
            files_dtos::FileResponseDto,
            ApiResponse<files_dtos::FileResponseDto>,
            // Admin
            admin_dtos::UpdateUserStatusDto,
            admin_dtos::UserCounts,
            admin_dtos::AppointmentCounts,
            admin_dtos::PaymentTotals,
            admin_dtos::OverviewDto,
            ApiResponse<admin_dtos::OverviewDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session identity"),
        (name = "users", description = "Account profiles"),
        (name = "psychologists", description = "Psychologist profiles and public search"),
        (name = "appointments", description = "Session booking and lifecycle"),
        (name = "payments", description = "Payments and the gateway webhook"),
        (name = "reviews", description = "Patient reviews of completed sessions"),
        (name = "records", description = "Clinical records"),
        (name = "files", description = "Image uploads"),
        (name = "admin", description = "Moderation and platform statistics"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Mindwell API",
        version = "0.1.0",
        description = "API documentation for Mindwell",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
