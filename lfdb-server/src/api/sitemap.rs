//! XML sitemap of the public catalog

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::db::repairs;
use crate::{ApiError, ApiResult, AppState};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> ApiResult<()> {
    writer
        .write_event(event)
        .map_err(|e| ApiError::Internal(format!("Sitemap write failed: {}", e)))
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> ApiResult<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn url_entry(
    writer: &mut Writer<Vec<u8>>,
    loc: &str,
    lastmod: Option<&DateTime<Utc>>,
) -> ApiResult<()> {
    emit(writer, Event::Start(BytesStart::new("url")))?;
    text_element(writer, "loc", loc)?;
    if let Some(ts) = lastmod {
        text_element(writer, "lastmod", &ts.to_rfc3339_opts(SecondsFormat::Secs, true))?;
    }
    emit(writer, Event::End(BytesEnd::new("url")))
}

/// Render the sitemap for `base_url` and the approved repairs
pub fn render_sitemap(base_url: &str, approved: &[(String, DateTime<Utc>)]) -> ApiResult<String> {
    let base = base_url.trim_end_matches('/');
    let mut writer = Writer::new(Vec::new());

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)])),
    )?;
    url_entry(&mut writer, base, None)?;
    url_entry(&mut writer, &format!("{}/repairs", base), None)?;
    for (id, updated_at) in approved {
        url_entry(&mut writer, &format!("{}/repairs/{}", base, id), Some(updated_at))?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("urlset")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| ApiError::Internal(format!("Sitemap is not UTF-8: {}", e)))
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> ApiResult<Response> {
    let approved = repairs::list_approved_ids(&state.db).await?;
    let body = render_sitemap(&state.config.public_url, &approved)?;
    Ok(([(CONTENT_TYPE, "application/xml")], body).into_response())
}

pub fn sitemap_routes() -> Router<AppState> {
    Router::new().route("/sitemap.xml", get(sitemap))
}
