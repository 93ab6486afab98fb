use mockito::Server;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const PNG_BYTES: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn imageview_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_imageview"));
    // Keep user configuration out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent")
        .env_remove("IMAGEVIEW_ROOTS")
        .env_remove("IMAGEVIEW_TEMP_DIR")
        .env_remove("IMAGEVIEW_KEEP_TEMP_FILES");
    cmd
}

fn run_with_args(args: &[&str]) -> (String, String, bool) {
    let output = imageview_cmd()
        .args(args)
        .output()
        .expect("Failed to run imageview");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_flag() {
    let (stdout, _, success) = run_with_args(&["--help"]);
    assert!(success);
    assert!(stdout.contains("imageview"));
    assert!(stdout.contains("hover"));
    assert!(stdout.contains("library"));
    assert!(stdout.contains("download"));
}

#[test]
fn test_hover_local_image() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("logo.png"), PNG_BYTES).unwrap();
    let input = temp_dir.path().join("index.html");
    std::fs::write(&input, "<img src=\"./logo.png\">\n").unwrap();

    let (stdout, _, success) =
        run_with_args(&["hover", "-i", path_str(&input), "-l", "0", "-C", "12"]);
    assert!(success);
    assert!(stdout.starts_with("![preview](file://"));
    assert!(stdout.contains("logo.png|width=200)"));
    assert!(stdout.contains("command:vscode.open?"));
}

#[test]
fn test_hover_custom_width() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("logo.png"), PNG_BYTES).unwrap();
    let input = temp_dir.path().join("index.html");
    std::fs::write(&input, "'logo.png'").unwrap();

    let (stdout, _, success) = run_with_args(&[
        "hover",
        "-i",
        path_str(&input),
        "-l",
        "0",
        "-C",
        "2",
        "--width",
        "320",
    ]);
    assert!(success);
    assert!(stdout.contains("|width=320)"));
}

#[test]
fn test_hover_missing_image() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("index.html");
    std::fs::write(&input, "\"./nope.gif\"").unwrap();

    let (stdout, _, success) =
        run_with_args(&["hover", "-i", path_str(&input), "-l", "0", "-C", "3"]);
    assert!(success);
    assert!(stdout.contains("⚠️ Image not found: `./nope.gif`"));
}

#[test]
fn test_hover_nothing_under_cursor() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("notes.txt");
    std::fs::write(&input, "no images here").unwrap();

    let (stdout, _, success) =
        run_with_args(&["hover", "-i", path_str(&input), "-l", "0", "-C", "3"]);
    assert!(success);
    assert!(stdout.is_empty());
}

#[test]
fn test_hover_remote_image_cleans_up() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/a.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(b"\xFF\xD8\xFF\xE0")
        .expect(1)
        .create();

    let temp_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let input = temp_dir.path().join("page.md");
    std::fs::write(&input, format!("\"{}/a.jpg\"", server.url())).unwrap();

    let (stdout, _, success) = run_with_args(&[
        "hover",
        "-i",
        path_str(&input),
        "-l",
        "0",
        "-C",
        "3",
        "--temp-dir",
        path_str(scratch.path()),
    ]);
    mock.assert();
    assert!(success);
    assert!(stdout.contains("imageview_"));
    assert!(stdout.contains("Download & Replace URL"));
    // Hover downloads are deleted when the process exits
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn test_hover_remote_keep_temp_files() {
    let mut server = Server::new();
    server
        .mock("GET", "/a.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(PNG_BYTES)
        .create();

    let temp_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let input = temp_dir.path().join("page.md");
    std::fs::write(&input, format!("'{}/a.png'", server.url())).unwrap();

    let (_, _, success) = run_with_args(&[
        "hover",
        "-i",
        path_str(&input),
        "-l",
        "0",
        "-C",
        "3",
        "--temp-dir",
        path_str(scratch.path()),
        "--keep-temp-files",
    ]);
    assert!(success);
    let kept: Vec<_> = std::fs::read_dir(scratch.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(std::fs::read(&kept[0]).unwrap(), PNG_BYTES);
}

#[test]
fn test_hover_remote_failure() {
    let mut server = Server::new();
    server.mock("GET", "/a.png").with_status(404).create();

    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("page.md");
    let url = format!("{}/a.png", server.url());
    std::fs::write(&input, format!("\"{}\"", url)).unwrap();

    let (stdout, _, success) = run_with_args(&[
        "hover",
        "-i",
        path_str(&input),
        "-l",
        "0",
        "-C",
        "3",
        "--temp-dir",
        path_str(temp_dir.path()),
    ]);
    assert!(success);
    assert!(stdout.contains(&format!("⚠️ **Could not load:** {}", url)));
}

#[test]
fn test_library_list() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("assets/icons")).unwrap();
    for name in ["a.png", "assets/b.JPG", "assets/icons/c.svg"] {
        std::fs::write(root.join(name), []).unwrap();
    }
    for name in ["readme.md", "assets/data.json"] {
        std::fs::write(root.join(name), []).unwrap();
    }

    let (stdout, _, success) = run_with_args(&["library", "--list", "-r", path_str(root)]);
    assert!(success);
    assert_eq!(stdout.lines().count(), 3);
    assert!(!stdout.contains("readme.md"));
}

#[test]
fn test_library_html() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir(root.join("img")).unwrap();
    std::fs::write(root.join("img/photo.webp"), []).unwrap();

    let (stdout, _, success) = run_with_args(&["library", "-r", path_str(root)]);
    assert!(success);
    assert!(stdout.contains("<html>"));
    assert!(stdout.contains(">img/photo.webp</div>"));
}

#[test]
fn test_library_roots_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("ws");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("x.ico"), []).unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!("roots = [{:?}]\nthumbnail_width = 48\n", path_str(&root)),
    )
    .unwrap();

    let (stdout, _, success) = run_with_args(&["library", "-c", path_str(&config_path)]);
    assert!(success);
    assert!(stdout.contains(">x.ico</div>"));
    assert!(stdout.contains("width=\"48\""));
}

#[test]
fn test_library_missing_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");

    let (_, stderr, success) = run_with_args(&["library", "-r", path_str(&missing)]);
    assert!(!success);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_download_and_replace() {
    let mut server = Server::new();
    server
        .mock("GET", "/a.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(PNG_BYTES)
        .create();

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let input = root.join("index.html");
    std::fs::write(&input, format!("<img src=\"{}/a.png\">\n", server.url())).unwrap();
    let target = root.join("images/a.png");

    let (stdout, _, success) = run_with_args(&[
        "download",
        "-i",
        path_str(&input),
        "-l",
        "0",
        "-C",
        "12",
        "-t",
        path_str(&target),
        "-r",
        path_str(root),
    ]);
    assert!(success);
    assert!(stdout.contains("✅ Saved: ./images/a.png"));
    assert_eq!(std::fs::read(&target).unwrap(), PNG_BYTES);
    assert_eq!(
        std::fs::read_to_string(&input).unwrap(),
        "<img src=\"./images/a.png\">\n"
    );
}

#[test]
fn test_download_from_command_link_args() {
    let mut server = Server::new();
    server
        .mock("GET", "/pic.gif")
        .with_status(200)
        .with_header("content-type", "image/gif")
        .with_body(b"GIF89a")
        .create();

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let input = root.join("notes.md");
    let url = format!("{}/pic.gif", server.url());
    std::fs::write(&input, format!("first line\nlogo: '{}'\n", url)).unwrap();

    let document_uri = url::Url::from_file_path(&input).unwrap().to_string();
    let args = serde_json::json!({
        "url": url,
        "documentUri": document_uri,
        "position": { "line": 1, "character": 8 },
    })
    .to_string();

    let (stdout, _, success) = run_with_args(&[
        "download",
        "--args",
        &urlencoding::encode(&args),
        "-r",
        path_str(root),
        "--images-dir",
        "assets",
    ]);
    assert!(success);
    assert!(stdout.contains("./assets/image.gif"));
    assert_eq!(
        std::fs::read_to_string(&input).unwrap(),
        "first line\nlogo: \"./assets/image.gif\"\n"
    );
}

#[test]
fn test_download_failure_leaves_document_unmodified() {
    let mut server = Server::new();
    server
        .mock("GET", "/a.png")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html></html>")
        .create();

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let input = root.join("index.html");
    let original = format!("\"{}/a.png\"", server.url());
    std::fs::write(&input, &original).unwrap();

    let (_, stderr, success) = run_with_args(&[
        "download",
        "-i",
        path_str(&input),
        "-l",
        "0",
        "-C",
        "3",
        "-r",
        path_str(root),
    ]);
    assert!(!success);
    assert!(stderr.contains("Invalid response: 200"));
    assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
    assert!(!root.join("images/image.png").exists());
}

#[test]
fn test_quiet_mode() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("notes.txt");
    std::fs::write(&input, "\"x.png\"").unwrap();

    let (_, stderr, success) =
        run_with_args(&["hover", "-q", "-i", path_str(&input), "-l", "0", "-C", "1"]);
    assert!(success);
    assert!(stderr.is_empty());
}
