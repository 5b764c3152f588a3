//! HTTP Handlers

use crate::application::config::GateConfig;
use crate::application::issue_challenge::{IssueChallengeInput, IssueChallengeUseCase};
use crate::application::submit_solution::{SubmitSolutionInput, SubmitSolutionUseCase};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::provider::ChallengeProvider;
use crate::domain::repository::{ReplayStore, SessionStore};
use crate::error::GateError;
use crate::presentation::dto::{ChallengePage, ChallengeQuery, SubmitForm, SubmitResponse};
use crate::presentation::session::RequestSession;
use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Redirect, Response};
use kernel::error::app_error::AppError;
use std::sync::Arc;

/// Shared state for gate handlers and the interception middleware
pub struct GateState<R, P>
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    pub store: Arc<R>,
    pub provider: Arc<P>,
    pub config: Arc<GateConfig>,
    pub clock: Arc<dyn Clock>,
}

impl<R, P> GateState<R, P>
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    pub fn new(store: R, provider: P, config: GateConfig) -> Self {
        Self::with_clock(
            Arc::new(store),
            Arc::new(provider),
            Arc::new(config),
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        store: Arc<R>,
        provider: Arc<P>,
        config: Arc<GateConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            clock,
        }
    }
}

// Derive would demand `R: Clone` and `P: Clone`.
impl<R, P> Clone for GateState<R, P>
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            provider: self.provider.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// GET on the challenge path
pub async fn issue_challenge<R, P>(
    State(state): State<GateState<R, P>>,
    headers: HeaderMap,
    query: Result<Query<ChallengeQuery>, QueryRejection>,
) -> Response
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    let ChallengeQuery { next } = query.map(|Query(q)| q).unwrap_or_default();
    let session = RequestSession::resolve(&headers, &state.config);

    let use_case = IssueChallengeUseCase::new(
        state.store.clone(),
        state.provider.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let input = IssueChallengeInput {
        next,
        session: (!session.minted).then_some(session.id),
    };

    let output = match use_case.execute(input).await {
        Ok(output) => output,
        Err(e) => return e.into_response(),
    };

    let page = ChallengePage {
        challenge: output.challenge.into(),
        next_url: output.next_url,
        referrer: output.referrer,
        message: state.config.messages.message.clone(),
        help_message: state.config.messages.help_message.clone(),
        js_src_url: state.config.assets.js_url.clone(),
        css_url: state.config.assets.css_url.clone(),
        site_icon_url: state.config.assets.site_icon_url.clone(),
    };

    with_session_cookie(Json(page).into_response(), session.set_cookie(&state.config))
}

/// POST on the submit path
pub async fn submit_solution<R, P>(
    State(state): State<GateState<R, P>>,
    headers: HeaderMap,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Response
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable submission form");
            SubmitForm::default()
        }
    };
    let session = RequestSession::resolve(&headers, &state.config);

    let use_case = SubmitSolutionUseCase::new(
        state.store.clone(),
        state.provider.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let input = SubmitSolutionInput {
        encoded_payload: form.altcha,
        next: form.next,
        session: session.id,
    };

    let response = match use_case.execute(input).await {
        Ok(output) if prefers_html(&headers) => Redirect::to(&output.next_url).into_response(),
        Ok(_) => Json(SubmitResponse { success: true }).into_response(),
        Err(e) if e.is_rejection() => rejection_response(&state.config, &e),
        Err(e) => e.into_response(),
    };

    with_session_cookie(response, session.set_cookie(&state.config))
}

fn rejection_response(config: &GateConfig, error: &GateError) -> Response {
    tracing::warn!(reason = error.reason(), error = %error, "Challenge submission rejected");
    AppError::new(config.failure_kind, config.messages.fail_message.clone()).into_response()
}

/// Browsers posting the form directly get a redirect instead of JSON
fn prefers_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html") && !accept.contains("json"))
}

pub(crate) fn with_session_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
