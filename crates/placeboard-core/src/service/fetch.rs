//! Board store client using the browser `fetch` API.

use super::{
    check_acknowledgement, encode_batch, parse_board, BoardService, BoxFuture, ServiceError,
    ServiceResult,
};
use crate::board::BoardRows;
use crate::config::ClientConfig;
use crate::pending::PixelEdit;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Board store reached through `window.fetch`.
pub struct FetchBoardService {
    fetch_url: String,
    submit_url: String,
}

impl FetchBoardService {
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let fetch_url = config
            .fetch_url()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        let submit_url = config
            .submit_url()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        Ok(Self {
            fetch_url: fetch_url.into(),
            submit_url: submit_url.into(),
        })
    }
}

fn js_error(e: JsValue) -> ServiceError {
    ServiceError::Network(format!("{:?}", e))
}

/// Issue a request and return `(ok, status, body)`.
async fn send(request: Request) -> ServiceResult<(bool, u16, String)> {
    let window = web_sys::window().ok_or_else(|| ServiceError::Network("No window".to_string()))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| ServiceError::Malformed("fetch did not return a Response".to_string()))?;

    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    let body = text
        .as_string()
        .ok_or_else(|| ServiceError::Malformed("Response body is not text".to_string()))?;

    Ok((response.ok(), response.status(), body))
}

impl BoardService for FetchBoardService {
    fn fetch_board(&self) -> BoxFuture<'_, ServiceResult<BoardRows>> {
        Box::pin(async move {
            let init = RequestInit::new();
            init.set_method("GET");
            init.set_mode(RequestMode::Cors);
            let request = Request::new_with_str_and_init(&self.fetch_url, &init).map_err(js_error)?;

            let (ok, status, body) = send(request).await?;
            if !ok {
                return Err(ServiceError::Status(status));
            }
            parse_board(&body)
        })
    }

    fn submit_edits(&self, edits: &[PixelEdit]) -> BoxFuture<'_, ServiceResult<()>> {
        let payload = encode_batch(edits);
        Box::pin(async move {
            let payload = payload?;
            let init = RequestInit::new();
            init.set_method("POST");
            init.set_mode(RequestMode::Cors);
            init.set_body(&JsValue::from_str(&payload));
            let request =
                Request::new_with_str_and_init(&self.submit_url, &init).map_err(js_error)?;
            // A text/plain body keeps the request "simple" and skips the CORS preflight.
            request
                .headers()
                .set("Content-Type", "text/plain;charset=utf-8")
                .map_err(js_error)?;

            let (ok, status, body) = send(request).await?;
            check_acknowledgement(ok, status, &body)
        })
    }
}
