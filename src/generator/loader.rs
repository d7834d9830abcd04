//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 图片加载是状态机的外部协作者：给定 URL，异步返回“成功”或“失败”二者之一。
//! 这里用 [`ImageLoader`] trait 抽象这一能力，服务层只依赖 trait，
//! 测试可以注入脚本化实现。
//!
//! ## 实现思路（`HttpImageLoader`）
//!
//! - 协议校验 → 发送请求（跟随有限次重定向）→ 状态码 → 内容类型 → 体积上限 → 流式读取。
//! - 读取完成后用 `infer` 嗅探魔数，再用 `image` 只读取头部宽高，不做像素解码。
//! - 网络错误统一映射到 [`GeneratorError`]，日志中的 URL 去掉查询串。

use std::future::Future;
use std::io::Cursor;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use super::{GeneratorConfig, GeneratorError};

const MAX_REDIRECTS: usize = 5;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 加载成功后的图片信息。
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// 图片加载能力。
pub trait ImageLoader: Send + Sync + 'static {
    /// 加载 URL 并确认响应是可识别的图片。
    fn load(&self, url: &str) -> impl Future<Output = Result<LoadedImage, GeneratorError>> + Send;

    /// 仅获取原始字节，供下载动作使用。
    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Bytes, GeneratorError>> + Send;
}

/// 基于 reqwest 的加载实现。
pub struct HttpImageLoader {
    client: reqwest::Client,
    max_file_size: u64,
    stream_chunk_timeout: Duration,
}

impl HttpImageLoader {
    /// 构建复用型 HTTP 客户端。
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| GeneratorError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            client,
            max_file_size: config.max_file_size,
            stream_chunk_timeout: Duration::from_millis(config.stream_chunk_timeout_ms),
        })
    }

    /// 发送请求并流式读取响应体，返回字节与声明的内容类型。
    async fn fetch(&self, url: &str) -> Result<(Bytes, Option<String>), GeneratorError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| GeneratorError::InvalidFormat(format!("URL 格式错误：{}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GeneratorError::InvalidFormat(format!(
                "不支持的协议：{}",
                parsed.scheme()
            )));
        }

        log::debug!("📡 发送 HTTP 请求 - URL: {}", redact_url_for_log(url));
        let mut response = self
            .client
            .get(parsed)
            .header(
                reqwest::header::ACCEPT,
                "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > self.max_file_size {
                return Err(GeneratorError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    self.max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(self.max_file_size) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = BytesMut::with_capacity(initial_capacity);

        loop {
            let next = tokio::time::timeout(self.stream_chunk_timeout, response.chunk())
                .await
                .map_err(|_| GeneratorError::Timeout("下载数据流读取超时".to_string()))?;

            let Some(chunk) = next.map_err(|e| map_reqwest_error(&e))? else {
                break;
            };

            if (buffer.len() + chunk.len()) as u64 > self.max_file_size {
                return Err(GeneratorError::ResourceLimit(
                    "下载后文件超过大小限制".to_string(),
                ));
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok((buffer.freeze(), content_type))
    }
}

impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<LoadedImage, GeneratorError> {
        let started = Instant::now();
        let (bytes, content_type) = self.fetch(url).await?;
        let fetch_elapsed = started.elapsed();

        if let Some(ct) = content_type.as_deref() {
            if !is_image_content_type(ct) {
                return Err(GeneratorError::InvalidFormat(format!("不是图片类型：{}", ct)));
            }
        }

        let (mime_type, width, height) = inspect_image(&bytes)?;

        log::info!(
            "✅ 图片加载完成 - URL: {} 类型: {} 尺寸: {}x{} 体积: {}KB fetch={}ms",
            redact_url_for_log(url),
            mime_type,
            width,
            height,
            bytes.len() / 1024,
            fetch_elapsed.as_millis()
        );

        Ok(LoadedImage {
            mime_type,
            width,
            height,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, GeneratorError> {
        let (bytes, _) = self.fetch(url).await?;
        Ok(bytes)
    }
}

/// 嗅探魔数并读取头部宽高。
pub(crate) fn inspect_image(bytes: &[u8]) -> Result<(&'static str, u32, u32), GeneratorError> {
    if bytes.is_empty() {
        return Err(GeneratorError::InvalidFormat("响应体为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| GeneratorError::InvalidFormat("无法识别的文件签名".to_string()))?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(GeneratorError::InvalidFormat(format!(
            "不是图片文件：{}",
            kind.mime_type()
        )));
    }

    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GeneratorError::Decode(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| GeneratorError::Decode(format!("无法读取图片尺寸：{}", e)))?;

    Ok((kind.mime_type(), width, height))
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

fn map_reqwest_error(error: &reqwest::Error) -> GeneratorError {
    if error.is_timeout() {
        GeneratorError::Timeout(format!("请求超时：{}", error))
    } else {
        GeneratorError::Network(format!("请求失败：{}", error))
    }
}

/// 日志中去掉查询串与片段。
pub(crate) fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let headers = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                content_type,
                body.len()
            );
            // 客户端可能提前断开（如体积超限），写入失败不视为测试失败
            let _ = stream.write_all(headers.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        });

        (format!("http://127.0.0.1:{}/64/32?random=1", addr.port()), server)
    }

    #[tokio::test]
    async fn load_accepts_real_png() {
        let (url, server) = serve_once("200 OK", "image/png", create_png_bytes(64, 32));
        let loader = HttpImageLoader::new(&GeneratorConfig::default()).expect("loader init failed");

        let loaded = loader.load(&url).await.expect("png should load");
        server.join().expect("server thread failed");

        assert_eq!(loaded.mime_type, "image/png");
        assert_eq!((loaded.width, loaded.height), (64, 32));
    }

    #[tokio::test]
    async fn load_rejects_non_image_body_even_when_content_type_is_image() {
        let (url, server) = serve_once("200 OK", "image/jpeg", b"hello world".to_vec());
        let loader = HttpImageLoader::new(&GeneratorConfig::default()).expect("loader init failed");

        let result = loader.load(&url).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(GeneratorError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn load_rejects_html_content_type() {
        let (url, server) = serve_once("200 OK", "text/html", create_png_bytes(4, 4));
        let loader = HttpImageLoader::new(&GeneratorConfig::default()).expect("loader init failed");

        let result = loader.load(&url).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(GeneratorError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn http_error_status_is_network_failure() {
        let (url, server) = serve_once("404 Not Found", "text/plain", b"missing".to_vec());
        let loader = HttpImageLoader::new(&GeneratorConfig::default()).expect("loader init failed");

        let result = loader.load(&url).await;
        server.join().expect("server thread failed");

        match result {
            Err(GeneratorError::Network(message)) => assert!(message.contains("404")),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let (url, server) = serve_once("200 OK", "image/png", create_png_bytes(64, 64));
        let config = GeneratorConfig {
            max_file_size: 16,
            ..GeneratorConfig::default()
        };
        let loader = HttpImageLoader::new(&config).expect("loader init failed");

        let result = loader.fetch_bytes(&url).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(GeneratorError::ResourceLimit(_))));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected() {
        let loader = HttpImageLoader::new(&GeneratorConfig::default()).expect("loader init failed");
        let result = loader.load("file:///etc/passwd").await;
        assert!(matches!(result, Err(GeneratorError::InvalidFormat(_))));
    }

    #[test]
    fn inspect_rejects_empty_and_non_image() {
        assert!(matches!(inspect_image(&[]), Err(GeneratorError::InvalidFormat(_))));
        assert!(matches!(
            inspect_image(b"<html><body>not an image</body></html>"),
            Err(GeneratorError::InvalidFormat(_))
        ));
    }

    #[test]
    fn content_type_parser_accepts_image_with_params() {
        assert!(is_image_content_type("image/jpeg; charset=binary"));
        assert!(is_image_content_type(" IMAGE/PNG"));
        assert!(!is_image_content_type("text/html"));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        assert_eq!(
            redact_url_for_log("https://picsum.photos/800/600?random=123#x"),
            "https://picsum.photos/800/600"
        );
        assert_eq!(redact_url_for_log("not a url"), "<invalid-url>");
    }
}
