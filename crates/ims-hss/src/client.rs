use async_trait::async_trait;

use crate::cx::{MultimediaAuthAnswer, MultimediaAuthRequest, ServerAssignmentAnswer, ServerAssignmentRequest};
use crate::error::HssError;

/// The Diameter-Cx collaborator the coordinator refreshes the cache from on
/// miss or expiry. Inbound PPR/RTR are not part of this trait: a production
/// binding routes those off of the Diameter stack's own inbound-transaction
/// handling directly into `ims_cache::Coordinator::handle_push_profile` /
/// `handle_registration_termination`.
#[async_trait]
pub trait HssClient: Send + Sync {
    async fn multimedia_auth(
        &self,
        request: MultimediaAuthRequest,
    ) -> Result<MultimediaAuthAnswer, HssError>;

    async fn server_assignment(
        &self,
        request: ServerAssignmentRequest,
    ) -> Result<ServerAssignmentAnswer, HssError>;
}
