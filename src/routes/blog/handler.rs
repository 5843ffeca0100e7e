use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    result::{ApiResponse, message_to_api_response, success_to_api_response},
    store::{Blog, NewBlog},
};

use super::model::CreateBlogRequest;

#[axum::debug_handler]
pub async fn create_blog(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Blog>>), AppError> {
    req.validate().map_err(AppError::Validation)?;

    let blog = state
        .blogs
        .create(NewBlog {
            title: req.title,
            content: req.content,
            user_id: user.claims.user_id,
        })
        .await?;

    tracing::info!(blog_id = blog.id, user_id = blog.user_id, "Created blog");
    Ok((
        StatusCode::CREATED,
        success_to_api_response("Blog created successfully", blog),
    ))
}

#[axum::debug_handler]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Blog>>, AppError> {
    let blog = state
        .blogs
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog not found".into()))?;

    Ok(success_to_api_response("Blog retrieved successfully", blog))
}

/// 只有作者本人可以删除，不存在和无权限都返回 404
#[axum::debug_handler]
pub async fn delete_blog(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.blogs.delete(id, user.claims.user_id).await? {
        return Err(AppError::NotFound("blog not found".into()));
    }

    Ok(message_to_api_response("Blog deleted successfully"))
}

#[axum::debug_handler]
pub async fn list_blogs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Blog>>>, AppError> {
    let blogs = state.blogs.list().await?;
    Ok(success_to_api_response("List of all blogs", blogs))
}
