//! `pvectl api <verb> <path> [key=value...]`: raw access to any endpoint.

use std::str::FromStr;

use pve_api::{ActionResult, Method, PveClient};

use crate::cli::{ApiArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

/// A validated raw request, checked before any connection is made.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn parse(args: ApiArgs) -> Result<Self, CliError> {
        let method = Method::from_str(&args.method)?;
        let params = util::parse_params(&args.params)?;

        if !params.is_empty() && !method.has_body() {
            tracing::warn!(%method, "parameters are ignored for this verb");
        }

        Ok(Self {
            method,
            path: args.path,
            params,
        })
    }
}

pub async fn handle(
    client: &PveClient,
    request: ApiRequest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = client
        .request(request.method.as_str(), &request.path, Some(&request.params))
        .await?;

    match result {
        ActionResult::Completed => {
            if !global.quiet {
                eprintln!("{} {}: OK", request.method, request.path);
            }
        }
        ActionResult::Data(data) => {
            let out = output::render_value(&global.output, &data)?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
