// API client module: a small blocking HTTP client for the chfs file
// server. Login yields a cookie session that the single upload reuses.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{PublishError, PublishResult};

const SESSION_PATH: &str = "/chfs/session";
const UPLOAD_PATH: &str = "/chfs/upload";

/// Login credentials sent as multipart text fields `user` and `pwd`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookies handed out by a successful login, in the order the server sent
/// them. Always holds `JWT` and `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<(String, String)>,
}

impl Session {
    /// Build a session from response cookies. Fails when `JWT` or `user`
    /// is absent.
    pub fn from_cookies<I>(cookies: I) -> PublishResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let session = Session {
            cookies: cookies.into_iter().collect(),
        };
        for required in ["JWT", "user"] {
            if session.get(required).is_none() {
                return Err(PublishError::MissingCookie(required));
            }
        }
        Ok(session)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn jwt(&self) -> &str {
        self.get("JWT").unwrap_or_default()
    }

    pub fn user(&self) -> &str {
        self.get("user").unwrap_or_default()
    }

    /// Value for a `Cookie` request header carrying every session cookie.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Blocking client bound to one file server.
#[derive(Clone)]
pub struct FileServerClient {
    client: Client,
    base_url: String,
}

impl FileServerClient {
    /// Create a client for `base_url`. Trailing slashes are dropped; a
    /// `timeout` of `None` lets requests block until the peer answers.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> PublishResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(FileServerClient {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST the credentials to the session endpoint. Only `201 Created`
    /// counts as success.
    pub fn login(&self, credentials: &Credentials) -> PublishResult<Session> {
        let url = self.url(SESSION_PATH);
        debug!(%url, user = %credentials.username, "logging in");
        let form = multipart::Form::new()
            .text("user", credentials.username.clone())
            .text("pwd", credentials.password.clone());
        let res = self.client.post(&url).multipart(form).send()?;
        let res = expect_created("login", res)?;

        let session = Session::from_cookies(
            res.cookies()
                .map(|c| (c.name().to_string(), c.value().to_string())),
        )?;
        info!(user = %session.user(), "file server login success");
        Ok(session)
    }

    /// Upload `file` into the remote `folder`, authenticated by `session`.
    pub fn upload(&self, session: &Session, file: &Path, folder: &str) -> PublishResult<()> {
        let url = self.url(UPLOAD_PATH);
        let handle = File::open(file).map_err(|source| PublishError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        let len = handle.metadata()?.len();
        let file_name = file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive.zip".into());
        debug!(%url, %file_name, %folder, bytes = len, "uploading");

        let part = multipart::Part::reader_with_length(handle, len)
            .file_name(file_name)
            .mime_str("application/zip")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("folder", folder.to_string());

        let res = self
            .client
            .post(&url)
            .header(COOKIE, session.cookie_header())
            .multipart(form)
            .send()?;
        expect_created("upload", res)?;
        info!(file = %file.display(), %folder, "file upload success");
        Ok(())
    }
}

fn expect_created(step: &'static str, res: Response) -> PublishResult<Response> {
    let status = res.status();
    if status == StatusCode::CREATED {
        Ok(res)
    } else {
        let body = res.text().unwrap_or_default();
        debug!(step, %status, %body, "unexpected file server response");
        Err(PublishError::UnexpectedStatus { step, status })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! One-shot HTTP responder used by the client and publisher tests.

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    #[derive(Debug)]
    pub struct CapturedRequest {
        pub method: String,
        pub path: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl CapturedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Canned response: status plus extra header lines.
    pub struct Reply {
        pub status: u16,
        pub headers: Vec<String>,
    }

    impl Reply {
        pub fn status(status: u16) -> Self {
            Reply {
                status,
                headers: Vec::new(),
            }
        }

        pub fn login_ok(jwt: &str, user: &str) -> Self {
            Reply {
                status: 201,
                headers: vec![
                    format!("Set-Cookie: JWT={jwt}; Path=/"),
                    format!("Set-Cookie: user={user}; Path=/"),
                ],
            }
        }
    }

    /// Serve `replies` in order, one connection each, on a random port.
    /// Joining the handle yields the captured requests.
    pub fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<CapturedRequest>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        let handle = thread::spawn(move || {
            replies
                .into_iter()
                .map(|reply| {
                    let (mut stream, _) = listener.accept().unwrap();
                    let mut reader = BufReader::new(stream.try_clone().unwrap());

                    let mut request_line = String::new();
                    reader.read_line(&mut request_line).unwrap();
                    let mut parts = request_line.split_whitespace();
                    let method = parts.next().unwrap_or_default().to_string();
                    let path = parts.next().unwrap_or_default().to_string();

                    let mut headers = Vec::new();
                    let mut content_length = 0usize;
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).unwrap();
                        let line = line.trim();
                        if line.is_empty() {
                            break;
                        }
                        if let Some((k, v)) = line.split_once(':') {
                            let (k, v) = (k.trim().to_string(), v.trim().to_string());
                            if k.eq_ignore_ascii_case("content-length") {
                                content_length = v.parse().unwrap_or(0);
                            }
                            headers.push((k, v));
                        }
                    }

                    let mut body = vec![0u8; content_length];
                    reader.read_exact(&mut body).unwrap();

                    let mut response = format!("HTTP/1.1 {} Mock\r\n", reply.status);
                    for header in &reply.headers {
                        response.push_str(header);
                        response.push_str("\r\n");
                    }
                    response.push_str("Content-Length: 0\r\nConnection: close\r\n\r\n");
                    stream.write_all(response.as_bytes()).unwrap();
                    stream.flush().unwrap();

                    CapturedRequest {
                        method,
                        path,
                        headers,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    }
                })
                .collect()
        });
        (url, handle)
    }
}
