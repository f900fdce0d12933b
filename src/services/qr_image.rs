use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use qrcode::QrCode;

use crate::error::PayError;

const QR_SIZE: u32 = 500;
const LOGO_SIZE: u32 = 100;
// The donation form's palette: dark blue modules on a pale blue field.
const DARK: Rgba<u8> = Rgba([0x18, 0x64, 0xab, 0xff]);
const LIGHT: Rgba<u8> = Rgba([0xe7, 0xf5, 0xff, 0xff]);

/// Renders a QRIS payload to a PNG.
pub fn render_png(payload: &str) -> Result<Vec<u8>, PayError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| PayError::QrImage(e.to_string()))?;
    let img: RgbaImage = code
        .render::<Rgba<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .quiet_zone(true)
        .dark_color(DARK)
        .light_color(LIGHT)
        .build();
    encode_png(&img)
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, PayError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| PayError::QrImage(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Renders, composites an optional logo, and publishes the QR image. With an
/// upload endpoint configured the PNG goes there as multipart form data and
/// the host's `fileUrl` comes back; without one the image is returned inline
/// as a data URL.
pub struct QrImagePublisher {
    client: reqwest::Client,
    upload_url: Option<String>,
}

impl QrImagePublisher {
    pub fn new(upload_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
        }
    }

    pub async fn publish(
        &self,
        payload: &str,
        logo_url: Option<&str>,
    ) -> Result<String, PayError> {
        let mut png = render_png(payload)?;
        if let Some(logo_url) = logo_url {
            png = self.overlay_logo(png, logo_url).await;
        }
        match &self.upload_url {
            Some(endpoint) => self.upload(endpoint, png).await,
            None => Ok(format!("data:image/png;base64,{}", BASE64.encode(&png))),
        }
    }

    /// Best effort: any failure keeps the plain QR.
    async fn overlay_logo(&self, png: Vec<u8>, logo_url: &str) -> Vec<u8> {
        match self.try_overlay(&png, logo_url).await {
            Ok(merged) => merged,
            Err(err) => {
                tracing::warn!("logo overlay failed, keeping plain QR: {err}");
                png
            }
        }
    }

    async fn try_overlay(&self, png: &[u8], logo_url: &str) -> Result<Vec<u8>, PayError> {
        let logo_bytes = self
            .client
            .get(logo_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PayError::QrImage(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| PayError::QrImage(e.to_string()))?;

        let logo = image::load_from_memory(&logo_bytes)
            .map_err(|e| PayError::QrImage(e.to_string()))?
            .resize_exact(LOGO_SIZE, LOGO_SIZE, imageops::FilterType::Lanczos3)
            .to_rgba8();
        let mut qr = image::load_from_memory(png)
            .map_err(|e| PayError::QrImage(e.to_string()))?
            .to_rgba8();

        let x = (qr.width().saturating_sub(LOGO_SIZE)) / 2;
        let y = (qr.height().saturating_sub(LOGO_SIZE)) / 2;
        imageops::overlay(&mut qr, &logo, x as i64, y as i64);
        encode_png(&qr)
    }

    async fn upload(&self, endpoint: &str, png: Vec<u8>) -> Result<String, PayError> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Uploaded {
            file_url: String,
        }

        let part = reqwest::multipart::Part::bytes(png)
            .file_name("qr.png")
            .mime_str("image/png")
            .map_err(|e| PayError::QrImage(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PayError::QrImage(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PayError::QrImage(format!(
                "image host returned {}",
                response.status()
            )));
        }
        let uploaded: Uploaded = response
            .json()
            .await
            .map_err(|e| PayError::QrImage(e.to_string()))?;
        Ok(uploaded.file_url)
    }
}
