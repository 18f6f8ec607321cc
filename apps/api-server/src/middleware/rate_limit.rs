//! Rate limiting middleware, keyed by client IP.
//!
//! The key is the socket peer address. Forwarded-for headers are only
//! honoured when the peer is one of the configured trusted proxies, so a
//! direct client cannot pick its own bucket.

use std::future::{Ready, ready};
use std::net::IpAddr;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;

use shopfront_core::ports::RateLimiter;
use shopfront_shared::ErrorResponse;

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    trusted_proxies: Arc<[IpAddr]>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    pub fn trust_proxies(mut self, proxies: &[IpAddr]) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }
}

/// Bucket key for a request.
fn client_key(req: &ServiceRequest, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = req.peer_addr().map(|addr| addr.ip()) else {
        return "unknown".to_string();
    };

    if trusted_proxies.contains(&peer) {
        if let Some(forwarded) = req.connection_info().realip_remote_addr() {
            return forwarded.to_string();
        }
    }
    peer.to_string()
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trusted_proxies: self.trusted_proxies.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    trusted_proxies: Arc<[IpAddr]>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();

        let key = client_key(&req, &self.trusted_proxies);

        Box::pin(async move {
            let result = match limiter.check(&key).await {
                Ok(result) => result,
                Err(e) => {
                    // Fail open
                    tracing::error!(error = %e, "Rate limiter error, allowing request");
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
            };

            if !result.allowed {
                tracing::warn!(client = %key, "Rate limit exceeded");

                let retry_after = result.reset_after.as_secs().max(1);
                let response = HttpResponse::TooManyRequests()
                    .insert_header(("RateLimit-Limit", result.limit.to_string()))
                    .insert_header(("RateLimit-Remaining", "0"))
                    .insert_header(("Retry-After", retry_after.to_string()))
                    .json(ErrorResponse::too_many_requests(
                        "Too many requests, please try again later.",
                    ));

                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static("ratelimit-limit"),
                HeaderValue::from(result.limit),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-remaining"),
                HeaderValue::from(result.remaining),
            );
            Ok(res.map_into_left_body())
        })
    }
}
