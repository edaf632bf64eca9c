use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};

use crate::{state::AppState, success, warning};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<Arc<AppState>>,
) -> Html<&'static str> {
    let Some(oauth) = state.dispatcher.oauth() else {
        return Html("<h4>Spotify authorization is not configured.</h4>");
    };

    if let Some(error) = params.get("error") {
        warning!("Spotify authorization was denied: {}", error);
        return Html("<h4>Authorization was denied.</h4>");
    }

    let (Some(code), Some(auth_state)) = (params.get("code"), params.get("state")) else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    match oauth.complete(auth_state, code).await {
        Ok(agent_id) => {
            success!("Tokens stored for agent: {}", agent_id);
            Html("<h2>Authentication successful.</h2><p>Close browser window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    }
}
