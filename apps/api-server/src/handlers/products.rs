//! Product catalog handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use shopfront_core::domain::{
    Brand, NewProduct, Product, ProductChanges, ProductQuery, ProductSort, ProductSortField,
    SortOrder,
};
use shopfront_core::error::RepoError;
use shopfront_core::ports::BaseRepository;
use shopfront_shared::MessageResponse;
use shopfront_shared::dto::{CreateProductRequest, UpdateProductRequest};

use super::{TOTAL_COUNT_HEADER, parse_id, parse_page};
use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Find a brand by name, creating it on first use.
async fn resolve_brand(state: &AppState, name: Option<&str>) -> AppResult<Brand> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Brand is required".to_string()))?;

    if let Some(brand) = state.brands.find_by_name(name).await? {
        return Ok(brand);
    }

    match state.brands.insert(Brand::new(name)?).await {
        Ok(brand) => {
            tracing::info!(brand_id = %brand.id, name = %brand.name, "Brand created for product");
            Ok(brand)
        }
        // A concurrent request created it between the lookup and the insert
        Err(RepoError::Constraint(_)) => state
            .brands
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Brand '{name}' could not be resolved"))),
        Err(e) => Err(e.into()),
    }
}

/// Translate `GET /products` query pairs into a [`ProductQuery`].
fn parse_product_query(pairs: &[(String, String)]) -> AppResult<ProductQuery> {
    let mut query = ProductQuery {
        page: parse_page(pairs)?,
        ..Default::default()
    };
    let mut sort_field: Option<ProductSortField> = None;
    let mut order = SortOrder::default();

    for (key, value) in pairs {
        match key.as_str() {
            "brand" => query.brand_ids.push(parse_id(value)?),
            "user" => query.exclude_deleted = true,
            "sort" => sort_field = Some(value.parse()?),
            "order" => order = value.parse::<SortOrder>()?,
            _ => {}
        }
    }

    query.sort = sort_field.map(|field| ProductSort { field, order });
    Ok(query)
}

/// POST /products
pub async fn create_product(
    state: web::Data<AppState>,
    caller: AuthUser,
    body: web::Json<CreateProductRequest>,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;
    let req = body.into_inner();

    let brand = resolve_brand(&state, req.brand.as_deref()).await?;
    let product = Product::new(
        NewProduct {
            title: req.title,
            description: req.description,
            price: req.price,
            discount_percentage: req.discount_percentage,
            stock_quantity: req.stock_quantity,
            image: req.image,
        },
        brand.id,
    )?;

    let product = state.products.insert(product).await?;
    tracing::info!(product_id = %product.id, "Product created");

    let details = state.products.find_details(product.id).await?;
    Ok(HttpResponse::Created().json(details))
}

/// GET /products
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> AppResult<HttpResponse> {
    let query = parse_product_query(&query)?;
    let page = state.products.list(&query).await?;

    Ok(HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, page.total.to_string()))
        .json(page.items))
}

/// GET /products/{id}
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let details = state
        .products
        .find_details(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(HttpResponse::Ok().json(details))
}

/// PATCH /products/{id}
pub async fn update_product(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateProductRequest>,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;
    let id = parse_id(&path)?;
    let req = body.into_inner();

    let mut product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let brand_id: Option<Uuid> = match req.brand.as_deref() {
        Some(name) => Some(resolve_brand(&state, Some(name)).await?.id),
        None => None,
    };

    product.apply(ProductChanges {
        title: req.title,
        description: req.description,
        price: req.price,
        discount_percentage: req.discount_percentage,
        stock_quantity: req.stock_quantity,
        image: req.image,
        is_deleted: req.is_deleted,
        brand_id,
    })?;
    let product = state.products.update(product).await?;

    let details = state.products.find_details(product.id).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// DELETE /products/{id}
pub async fn delete_product(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;
    let id = parse_id(&path)?;

    if state.products.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    state.products.delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Product deleted successfully")))
}
