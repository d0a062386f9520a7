// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP statements.
//!
//! ```text
//! method, url, headers, auth, body --> shared reqwest client
//! response capped at 10 MB; body stored in capture_as when set
//! non-2xx --> HttpError (catchable)
//! ```

use std::collections::BTreeMap;

use futures_util::StreamExt;

use crate::ast::HttpAuth;
use crate::engine::context::ExecutionContext;
use crate::error::{DrunResult, HttpError};

use super::Executor;

/// Hard cap on HTTP statement response size.
const RESPONSE_CAP: usize = 10 * 1024 * 1024;

impl Executor {
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn exec_http(
        &self,
        method: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        auth: Option<&HttpAuth>,
        body: Option<&str>,
        capture_as: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let url = self.interp().interpolate(url, ctx)?;
        let method = method.to_uppercase();

        if ctx.is_dry_run() {
            ctx.output()
                .line(format!("[DRY RUN] Would {method} {url}"));
            if let Some(name) = capture_as {
                let placeholder = format!("[dry-run:{}]", name.trim_start_matches('$'));
                ctx.set_variable(name.to_string(), placeholder);
            }
            return Ok(());
        }
        if ctx.is_verbose() {
            ctx.output().line(format!("🏃 {method} {url}"));
        }

        let parsed_method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| HttpError::InvalidHeader(format!("bad method '{method}'")))?;

        let mut request = crate::net::shared_client().request(parsed_method, &url);

        for (name, value) in headers {
            let value = self.interp().interpolate(value, ctx)?;
            request = request.header(
                reqwest::header::HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| HttpError::InvalidHeader(name.clone()))?,
                reqwest::header::HeaderValue::from_str(&value)
                    .map_err(|_| HttpError::InvalidHeader(name.clone()))?,
            );
        }

        match auth {
            Some(HttpAuth::Bearer { token }) => {
                request = request.bearer_auth(self.interp().interpolate(token, ctx)?);
            }
            Some(HttpAuth::Basic { username, password }) => {
                request = request.basic_auth(
                    self.interp().interpolate(username, ctx)?,
                    Some(self.interp().interpolate(password, ctx)?),
                );
            }
            None => {}
        }

        if let Some(body) = body {
            request = request.body(self.interp().interpolate(body, ctx)?);
        }

        let response = request.send().await.map_err(|source| HttpError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url,
            }
            .into());
        }

        if let Some(length) = response.content_length()
            && length as usize > RESPONSE_CAP
        {
            return Err(HttpError::TooLarge {
                url,
                limit: RESPONSE_CAP,
            }
            .into());
        }

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| HttpError::Request {
                url: url.clone(),
                source,
            })?;
            if bytes.len() + chunk.len() > RESPONSE_CAP {
                return Err(HttpError::TooLarge {
                    url,
                    limit: RESPONSE_CAP,
                }
                .into());
            }
            bytes.extend_from_slice(&chunk);
        }

        if let Some(name) = capture_as {
            ctx.set_variable(
                name.to_string(),
                String::from_utf8_lossy(&bytes).into_owned(),
            );
        }

        if ctx.is_verbose() {
            ctx.output()
                .line(format!("✓ {} from {url}", status.as_u16()));
        }
        Ok(())
    }
}
