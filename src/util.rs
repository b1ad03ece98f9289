use std::{fmt, str::FromStr, net::{Ipv6Addr, Ipv4Addr}, time::Duration};

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{body::Incoming, http::{response, uri}, Request, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Deserialize;

use crate::prelude::*;


/// Request body type of all our outgoing requests.
pub(crate) type RequestBody = http_body_util::Full<Bytes>;

pub(crate) type HttpClient = Client<HttpsConnector<HttpConnector>, RequestBody>;


/// Scheme and authority of an HTTP service, e.g. `https://lectures.example.com`.
#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct HttpHost {
    pub(crate) scheme: uri::Scheme,
    pub(crate) authority: uri::Authority,
}

impl HttpHost {
    /// Returns a full URI by combining `self` with the given path+query. Panics
    /// if `pq` is malformed!
    pub(crate) fn with_path_and_query(&self, pq: &str) -> Uri {
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(pq)
            .build()
            .expect("invalid URI path+query")
    }
}

impl fmt::Display for HttpHost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

impl fmt::Debug for HttpHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for HttpHost {
    type Err = anyhow::Error;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const SAFE_WORD: &str = "#allow-insecure";

        let without_safe_word = src.strip_suffix(SAFE_WORD).unwrap_or(src);
        let parts = without_safe_word.parse::<Uri>()?.into_parts();
        let has_real_path = parts.path_and_query.as_ref()
            .is_some_and(|pq| !pq.as_str().is_empty() && pq.as_str() != "/");
        if has_real_path {
            bail!("invalid HTTP host: must not contain a path");
        }

        let authority = parts.authority
            .ok_or(anyhow!("invalid HTTP host: contains no authority part"))?;
        let scheme = parts.scheme
            .ok_or(anyhow!("invalid HTTP host: has to specify 'http' or 'https'"))?;

        if scheme != uri::Scheme::HTTP && scheme != uri::Scheme::HTTPS {
            bail!("scheme has to be 'http' or 'https'");
        }

        if !authority.as_str().starts_with(authority.host()) {
            bail!("userinfo not allowed in authority");
        }

        // For local hosts we allow HTTP, for all others the safe word is
        // required. This only guards against typos.
        let host = authority.host();
        let is_local = {
            let bracketed_ipv6 = host.strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .and_then(|h| h.parse::<Ipv6Addr>().ok());

            if let Some(ipv6) = bracketed_ipv6 {
                ipv6.is_loopback()
            } else if let Ok(ipv4) = host.parse::<Ipv4Addr>() {
                ipv4.is_loopback()
            } else {
                host == "localhost"
            }
        };

        if scheme == uri::Scheme::HTTP && !(is_local || src.ends_with(SAFE_WORD)) {
            bail!("if you really want to use unencrypted HTTP for non-local hosts, \
                confirm by specifing the host as 'http://{host}{SAFE_WORD}'");
        }

        Ok(Self { scheme, authority })
    }
}

impl TryFrom<String> for HttpHost {
    type Error = <Self as FromStr>::Err;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Returns an HTTP client that can also speak HTTPS. HTTPS is _not_ enforced!
pub(crate) fn http_client() -> Result<HttpClient> {
    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("failed to load native certificate roots")?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Ok(Client::builder(TokioExecutor::new()).build(https))
}

/// Sends `req`, waits at most `timeout` for the response head and downloads
/// the whole body.
pub(crate) async fn send_request(
    client: &HttpClient,
    req: Request<RequestBody>,
    timeout: Duration,
) -> Result<(response::Parts, Bytes)> {
    let uri = req.uri().clone();
    let response = tokio::time::timeout(timeout, client.request(req))
        .await
        .with_context(|| format!("request timed out after {timeout:?} (to '{uri}')"))?
        .with_context(|| format!("HTTP request failed (to '{uri}')"))?;

    let (parts, body) = response.into_parts();
    let body = download_body(body).await
        .with_context(|| format!("failed to download body from '{uri}'"))?;

    trace!("HTTP response from '{uri}': {parts:?}");
    Ok((parts, body))
}

/// Collects the whole body of a response into memory.
pub(crate) async fn download_body(body: Incoming) -> Result<Bytes> {
    Ok(body.collect().await?.to_bytes())
}


#[cfg(test)]
mod tests {
    use super::HttpHost;

    fn parse_http_host(s: &str) -> HttpHost {
        s.parse::<HttpHost>().unwrap_or_else(|e| panic!("could not parse '{s}' as HttpHost: {e}"))
    }

    const LOCAL_HOSTS: &[&str] = &[
        "localhost",
        "localhost:54321",
        "127.0.0.1",
        "127.1.2.3:4321",
        "[::1]:4321",
    ];

    const NON_LOCAL_HOSTS: &[&str] = &[
        "1.1.1.1:3456",
        "[2606:4700:4700::1111]",
        "lectures.example.com",
        "abcdefgh.supabase.co",
    ];

    #[test]
    fn https_always_allowed() {
        for host in LOCAL_HOSTS.iter().chain(NON_LOCAL_HOSTS) {
            parse_http_host(&format!("https://{host}"));
        }
    }

    #[test]
    fn http_only_for_local_hosts() {
        for host in LOCAL_HOSTS {
            parse_http_host(&format!("http://{host}"));
        }
        for host in NON_LOCAL_HOSTS {
            format!("http://{host}").parse::<HttpHost>().unwrap_err();
            parse_http_host(&format!("http://{host}#allow-insecure"));
        }
    }

    #[test]
    fn path_is_rejected() {
        "https://lectures.example.com/rest".parse::<HttpHost>().unwrap_err();
        parse_http_host("https://lectures.example.com/");
    }

    #[test]
    fn uri_building() {
        let host = parse_http_host("https://lectures.example.com");
        let uri = host.with_path_and_query("/rest/v1/lectures?limit=3");
        assert_eq!(uri.to_string(), "https://lectures.example.com/rest/v1/lectures?limit=3");
    }
}
