//! Token acquisition plus a single Graph call, with the messages shown on failure.

use chosei_core::directory::DirectoryUser;
use chosei_core::invite::MeetingInvite;

use crate::auth::{DIRECTORY_SCOPES, INVITE_SCOPES, IdentitySession};
use crate::client::GraphClient;
use crate::convert::ToGraph;
use crate::error::{GraphError, GraphResult};
use crate::types::CreatedEvent;

pub const DIRECTORY_FAILURE_MESSAGE: &str = "ユーザーの取得に失敗しました";
pub const UNEXPECTED_FORMAT_MESSAGE: &str = "予期しないデータ形式です";

pub async fn send_invite(
    session: &mut IdentitySession,
    client: &GraphClient,
    invite: &MeetingInvite,
) -> GraphResult<CreatedEvent> {
    let token = session.acquire_token(INVITE_SCOPES).await?;
    client.create_event(&token, &invite.to_graph()).await
}

pub async fn fetch_directory(
    session: &mut IdentitySession,
    client: &GraphClient,
) -> GraphResult<Vec<DirectoryUser>> {
    let token = session.acquire_token(DIRECTORY_SCOPES).await?;
    client.list_users(&token).await
}

pub fn directory_failure_message(err: &GraphError) -> &'static str {
    match err {
        GraphError::UnexpectedFormat(_) => UNEXPECTED_FORMAT_MESSAGE,
        _ => DIRECTORY_FAILURE_MESSAGE,
    }
}
