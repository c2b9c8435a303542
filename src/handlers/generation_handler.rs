use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::{
        domain::{GenerationRequest, RawModelReply},
        dto::{
            request::{GenerateRequestDto, ReplyRequestDto},
            response::GenerateResponse,
        },
    },
};

#[post("/api/generate")]
pub async fn generate(
    state: web::Data<AppState>,
    request: web::Json<GenerateRequestDto>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let client = state.generation_client()?;
    // an overlapping request waits at least one second
    let permit = state
        .cooldown
        .try_begin()
        .ok_or_else(|| AppError::CooldownActive {
            remaining_seconds: state.cooldown.remaining().max(1),
        })?;

    let generation = GenerationRequest::from_payload(request.mode, &request.payload);
    let prompt = state.prompt_builder.build(&generation);
    log::info!("Generating {} ({} prompt chars)", request.mode, prompt.chars().count());

    let reply = client.generate(&prompt).await?;
    permit.finish(state.config.cooldown_seconds);

    Ok(HttpResponse::Ok().json(GenerateResponse {
        text: reply.into_inner(),
    }))
}

#[post("/api/normalize")]
pub async fn normalize(
    state: web::Data<AppState>,
    request: web::Json<ReplyRequestDto>,
) -> Result<HttpResponse, AppError> {
    let ReplyRequestDto { mode, text } = request.into_inner();
    let artifact = state.normalizer.normalize(mode, &RawModelReply::new(text));
    Ok(HttpResponse::Ok().json(artifact))
}
