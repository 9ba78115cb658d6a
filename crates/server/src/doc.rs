use crate::{
    dtos::{admin, auth as auth_dtos, customer, request},
    routes::{admin as admin_routes, auth, customer as customer_routes, health, reports, root, staff},
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        customer_routes::get_table,
        customer_routes::create_request,
        auth::me,
        auth::onboard,
        staff::list_tables,
        staff::list_requests,
        staff::get_request,
        staff::update_request,
        staff::complete_table,
        staff::clear_completed,
        staff::heatmap,
        staff::stream,
        reports::get_reports,
        admin_routes::list_tables,
        admin_routes::create_table,
        admin_routes::delete_table,
        admin_routes::add_staff,
        admin_routes::qr_links,
    ),
    components(schemas(
        customer::TablePageResponse,
        customer::RequestOption,
        customer::NewRequestForm,
        request::RequestResponse,
        request::RequestListResponse,
        request::UpdateStatusRequest,
        request::BulkResult,
        auth_dtos::ProfileResponse,
        auth_dtos::RestaurantResponse,
        auth_dtos::OnboardRequest,
        admin::TableResponse,
        admin::CreateTableRequest,
        admin::AddStaffRequest,
        admin::StaffMemberResponse,
        admin::QrLinkResponse,
        admin::ReportResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoints"),
        (name = "Customers", description = "Table pages and request submission"),
        (name = "Authentication", description = "Profiles and restaurant onboarding"),
        (name = "Staff", description = "Request dashboard, heatmap and change stream"),
        (name = "Admin", description = "Manager-only table and staff administration"),
    ),
    info(
        title = "Table Bud API",
        version = "1.0.0",
        description = "Table-service requests for restaurants",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;
