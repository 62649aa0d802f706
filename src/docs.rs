use utoipa::OpenApi;
use crate::modules::auth::dto::*;
use crate::modules::clip::dto::*;
use crate::modules::publish::dto::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::clip::handler::create_clip,
        crate::modules::clip::handler::list_clips,
        crate::modules::clip::handler::get_clip,
        crate::modules::clip::handler::delete_clip,
        crate::modules::clip::handler::export_clip,
        crate::modules::clip::handler::burn_subtitles,
        crate::modules::clip::handler::crop_clip,
        crate::modules::clip::handler::overlay_text,
        crate::modules::clip::stream_handler::download_clip,
        crate::modules::publish::handler::publish_clip,
        crate::modules::auth::handler::google_login,
        crate::modules::auth::handler::google_callback,
        crate::modules::auth::handler::credential_status,
    ),
    components(
        schemas(
            CreateClipRequest, TimeValue, ClipCreatedResponse, StageResponse,
            BurnSubtitlesRequest, CropRequest, OverlayTextRequest,
            PublishRequest, PublishResponse, TagsInput,
            CredentialStatusResponse,
            crate::modules::auth::model::CredentialState,
            crate::modules::clip::model::ClipJob,
            crate::modules::clip::model::TranscriptLine,
            crate::modules::subtitle::PrerollPolicy,
        )
    ),
    tags(
        (name = "Clips", description = "Clip jobs and transformation stages"),
        (name = "Publish", description = "Upload finished clips"),
        (name = "Auth", description = "Publishing credential")
    )
)]
pub struct ApiDoc;
