//! Security response headers and CORS policy.

use actix_cors::Cors;
use actix_web::http::{Method, header};
use actix_web::middleware::DefaultHeaders;

/// Headers added to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self'; img-src 'self' data:; object-src 'none'; frame-ancestors 'none'",
        ))
        .add((
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=63072000; includeSubDomains; preload",
        ))
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add(("Cross-Origin-Resource-Policy", "cross-origin"))
}

/// CORS for the storefront client. Credentials are allowed so the session
/// cookies travel with cross-origin requests.
///
/// Without a configured origin any origin is mirrored back, which is only
/// meant for local development.
pub fn cors(origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-total-count")])
        .supports_credentials()
        .max_age(3600);

    match origin {
        Some(origin) => {
            tracing::info!(%origin, "CORS restricted to configured origin");
            cors.allowed_origin(origin)
        }
        None => {
            tracing::warn!("ORIGIN not set - CORS allows any origin");
            cors.allow_any_origin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    #[actix_web::test]
    async fn test_security_headers_are_present() {
        let app = test::init_service(
            App::new()
                .wrap(security_headers())
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let headers = res.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(
            headers
                .get("strict-transport-security")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("preload")
        );
    }

    #[actix_web::test]
    async fn test_cors_exposes_total_count_to_configured_origin() {
        let app = test::init_service(
            App::new()
                .wrap(cors(Some("http://shop.test")))
                .route(
                    "/",
                    web::get().to(|| async {
                        HttpResponse::Ok().insert_header(("X-Total-Count", "3")).finish()
                    }),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "http://shop.test"))
            .to_request();
        let res = test::call_service(&app, req).await;

        let headers = res.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://shop.test"
        );
        assert!(
            headers
                .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("x-total-count")
        );
    }
}
