use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Video Store API",
        version = "1.0.0",
        description = r#"
# Video Store API

Customers, videos and the rentals between them.

Every checkout lends one physical copy and every check-in returns one. A
video's `available_inventory` and a customer's `videos_checked_out_count`
always agree with the rentals currently outstanding. Deleting a customer
returns their copies to stock; deleting a video closes its rentals.

All routes are served both at the root and under `/api/v1`.

## Error Handling

Failures share one body shape:

```json
{
  "error": "Not Found",
  "message": "Customer 42 was not found",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development"),
        (url = "http://localhost:8080/api/v1", description = "Local development (versioned)")
    ),
    tags(
        (name = "Customers", description = "Customer records and their rentals"),
        (name = "Videos", description = "Catalogue and inventory"),
        (name = "Rentals", description = "Checkout and check-in")
    ),
    paths(
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,
        crate::handlers::customers::customer_rentals,

        crate::handlers::videos::list_videos,
        crate::handlers::videos::create_video,
        crate::handlers::videos::get_video,
        crate::handlers::videos::update_video,
        crate::handlers::videos::delete_video,
        crate::handlers::videos::video_rentals,

        crate::handlers::rentals::check_out,
        crate::handlers::rentals::check_in,
    ),
    components(
        schemas(
            crate::entities::customer::Model,
            crate::entities::video::Model,
            crate::handlers::customers::CustomerRequest,
            crate::handlers::videos::VideoRequest,
            crate::handlers::rentals::RentalRequest,
            crate::handlers::common::DeletedResponse,
            crate::services::RentalReceipt,
            crate::services::RentedVideo,
            crate::services::VideoRenter,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_rental_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Video Store API"));
        assert!(json.contains("/rentals/check-out"));
        assert!(json.contains("/customers/{id}/rentals"));
        assert!(json.contains("RentalReceipt"));
    }
}
