#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use duotris::leaderboard::{get_scores, save_score, HandlerResponse, JsonFileStore, ScoreStore, RESPONSE_CAP};
    use log::{info, warn};
    use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

    /// Static file host for the browser build plus the leaderboard endpoints.
    #[derive(Parser, Debug, Clone)]
    struct Opts {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
        /// Directory holding index.html and the wasm bundle
        #[arg(long, default_value = "web")]
        web_root: PathBuf,
        /// JSON file the leaderboard is kept in
        #[arg(long, default_value = "scores.json")]
        scores: PathBuf,
    }

    const SCORES_PATH: &str = "/scores";

    const MIME_TYPES: &[(&str, &str)] = &[
        ("html", "text/html; charset=utf-8"),
        ("js", "text/javascript"),
        ("wasm", "application/wasm"),
        ("css", "text/css"),
        ("json", "application/json"),
        ("png", "image/png"),
        ("svg", "image/svg+xml"),
    ];

    #[derive(Debug, PartialEq, Eq)]
    enum Route {
        Preflight,
        ReadScores,
        SaveScore,
        Static,
        Unsupported,
    }

    fn route(method: &Method, path: &str) -> Route {
        match (method, path == SCORES_PATH) {
            (Method::Options, true) => Route::Preflight,
            (Method::Get, true) => Route::ReadScores,
            (Method::Post, true) => Route::SaveScore,
            (Method::Get | Method::Head, false) => Route::Static,
            _ => Route::Unsupported,
        }
    }

    /// The browser bundle directory. Requests resolve through canonical
    /// paths, so symlinks and `..` cannot reach outside it.
    struct WebRoot {
        dir: Option<PathBuf>,
    }

    impl WebRoot {
        fn open(dir: &Path) -> Self {
            Self {
                dir: fs::canonicalize(dir).ok(),
            }
        }

        fn resolve(&self, url_path: &str) -> Option<PathBuf> {
            let dir = self.dir.as_ref()?;
            let mut path = fs::canonicalize(dir.join(url_path.trim_start_matches('/'))).ok()?;
            if path.is_dir() {
                path.push("index.html");
            }
            (path.starts_with(dir) && path.is_file()).then_some(path)
        }
    }

    fn mime_for(path: &Path) -> &'static str {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        MIME_TYPES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map_or("application/octet-stream", |(_, mime)| *mime)
    }

    /// `limit` from our own client, `_limit` from json-server style callers.
    fn limit_param(query: &str) -> usize {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| matches!(*key, "limit" | "_limit"))
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(RESPONSE_CAP)
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let opts = Opts::parse();

        let web = WebRoot::open(&opts.web_root);
        match &web.dir {
            Some(dir) => info!("serving {}", dir.display()),
            None => warn!("web directory not found at {}, serving {SCORES_PATH} only", opts.web_root.display()),
        }
        let store = JsonFileStore::new(opts.scores.clone());
        info!("leaderboard stored in {}", store.path().display());

        let server = Server::http(&opts.listen).map_err(|e| anyhow::anyhow!("binding {}: {e}", opts.listen))?;
        info!("listening on http://{}", opts.listen);

        for request in server.incoming_requests() {
            let method = request.method().clone();
            let url = request.url().to_string();
            let status = handle(request, &web, &store);
            info!("{method} {url} -> {status}");
        }
        Ok(())
    }

    fn handle(mut request: Request, web: &WebRoot, store: &dyn ScoreStore) -> u16 {
        let url = request.url().to_string();
        let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
        match route(request.method(), path) {
            Route::Preflight => respond_json(request, empty_reply(204)),
            Route::ReadScores => respond_json(request, get_scores(store, limit_param(query))),
            Route::SaveScore => {
                let mut body = String::new();
                match request.as_reader().read_to_string(&mut body) {
                    Ok(_) => respond_json(request, save_score(store, &body)),
                    Err(e) => {
                        warn!("reading request body: {e}");
                        respond_json(request, empty_reply(400))
                    }
                }
            }
            Route::Static => match web.resolve(path).and_then(|p| fs::File::open(&p).ok().map(|f| (p, f))) {
                Some((p, file)) => {
                    let mut resp = Response::from_file(file);
                    add_header(&mut resp, "Content-Type", mime_for(&p));
                    send(request, resp)
                }
                None => send(request, Response::from_string("Not Found").with_status_code(StatusCode(404))),
            },
            Route::Unsupported => send(request, Response::from_string("Method Not Allowed").with_status_code(StatusCode(405))),
        }
    }

    fn empty_reply(status_code: u16) -> HandlerResponse {
        HandlerResponse {
            status_code,
            body: String::new(),
        }
    }

    fn add_header<R: std::io::Read>(resp: &mut Response<R>, name: &str, value: &str) {
        if let Ok(h) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            resp.add_header(h);
        }
    }

    fn respond_json(request: Request, reply: HandlerResponse) -> u16 {
        let mut resp: Response<Cursor<Vec<u8>>> =
            Response::from_string(reply.body).with_status_code(StatusCode(reply.status_code));
        add_header(&mut resp, "Content-Type", "application/json");
        add_header(&mut resp, "Access-Control-Allow-Origin", "*");
        add_header(&mut resp, "Access-Control-Allow-Methods", "GET, POST, OPTIONS");
        add_header(&mut resp, "Access-Control-Allow-Headers", "Content-Type");
        send(request, resp)
    }

    fn send<R: std::io::Read>(request: Request, resp: Response<R>) -> u16 {
        let status = resp.status_code().0;
        if let Err(e) = request.respond(resp) {
            warn!("writing response: {e}");
        }
        status
    }

}
