/*!
`show.rs`

Implements the `show` subcommand: print information about a charm or
bundle published in the charm store.

  charm show trusty/wordpress                      summary table
  charm show wordpress --channel edge              summary from a channel
  charm show wordpress charm-metadata charm-config selected fields (YAML)
  charm show wordpress --all --format json         every field
  charm show --list                                available field names

Modes (decided once from the arguments, see `Mode::resolve`):
  - List     : GET /meta/, plus the common-info sub-fields, sorted
  - All      : GET /meta/ then meta/any with every endpoint
  - Summary  : meta/any with SUMMARY_FIELDS; tabular report
  - Fields   : meta/any with exactly the given fields

`--format tabular` (the default) only renders a table in Summary mode;
everywhere else it falls back to YAML.

Nothing is written unless the whole command succeeds.
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use std::path::PathBuf;

use crate::charm::CharmUrl;
use crate::cmd::fields::{COMMON_INFO_FIELDS, SUMMARY_FIELDS, classify, project_common_info};
use crate::cmd::output::{OutputFormat, serialize, write_output};
use crate::cmd::shared::Session;
use crate::cmd::tabular::format_summary;
use crate::store::{AuthInfo, DEFAULT_SERVER_URL, StoreConfig};
use crate::{log_debug, log_info};

/// CLI arguments for `charm show [<charm or bundle id>] [field ...]`
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Charm or bundle id, e.g. `wordpress` or `cs:~bob/trusty/wordpress-3`
    #[arg(value_name = "ID")]
    pub id: Option<String>,

    /// Metadata fields to show instead of the summary
    #[arg(value_name = "FIELD")]
    pub fields: Vec<String>,

    /// Channel to use (stable, candidate, beta, edge, unpublished)
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<String>,

    /// List available metadata endpoints
    #[arg(long)]
    pub list: bool,

    /// Show all data from the charm or bundle
    #[arg(long)]
    pub all: bool,

    /// Basic auth credentials for the store
    #[arg(long, value_name = "USER:PASSWD")]
    pub auth: Option<AuthInfo>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tabular)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Charm store URL (set from the global --server / JUJU_CHARMSTORE)
    #[arg(skip)]
    pub server_url: Option<String>,

    /// Cookie file (set from JUJU_COOKIEFILE or the home directory)
    #[arg(skip)]
    pub cookie_file: Option<PathBuf>,
}

/// What `show` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    List,
    All { id: CharmUrl },
    Summary { id: CharmUrl },
    Fields { id: CharmUrl, fields: Vec<String> },
}

impl Mode {
    /// Validate flag combinations and parse the id. No I/O happens here.
    pub fn resolve(args: &ShowArgs) -> Result<Self> {
        if args.list {
            if args.id.is_some() || !args.fields.is_empty() {
                bail!("cannot specify charm or bundle with --list");
            }
            if args.all {
                bail!("cannot specify --list and --all at the same time");
            }
            return Ok(Mode::List);
        }

        let Some(raw) = args.id.as_deref() else {
            bail!("no charm or bundle id specified");
        };
        if args.all && !args.fields.is_empty() {
            bail!("cannot specify fields with --all");
        }
        let id = CharmUrl::parse(raw).context("invalid charm or bundle id")?;

        Ok(if args.all {
            Mode::All { id }
        } else if args.fields.is_empty() {
            Mode::Summary { id }
        } else {
            Mode::Fields {
                id,
                fields: args.fields.clone(),
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::List => "list",
            Mode::All { .. } => "all",
            Mode::Summary { .. } => "summary",
            Mode::Fields { .. } => "fields",
        }
    }
}

/// Entry point for the show subcommand.
pub fn execute_show(args: ShowArgs) -> Result<()> {
    let mode = Mode::resolve(&args)?;
    log_debug!("show: mode={} format={}", mode.name(), args.format);

    let config = StoreConfig {
        server_url: args
            .server_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
        channel: args.channel.clone(),
        auth: args.auth.clone(),
    };

    let bytes = {
        let mut session = Session::open(config, args.cookie_file.clone())?;
        run(&mut session, &mode, args.format)?
    };
    write_output(bytes, args.output.as_deref())?;
    if let Some(path) = &args.output {
        log_info!("output written to {}", path.display());
    }
    Ok(())
}

/// Perform the store requests for `mode` and render the result.
pub fn run(session: &mut Session, mode: &Mode, format: OutputFormat) -> Result<Vec<u8>> {
    let (id, fields, summary) = match mode {
        Mode::List => {
            let mut names = fetch_endpoints(session)?;
            names.extend(COMMON_INFO_FIELDS.iter().map(|s| s.to_string()));
            names.sort();
            return serialize(&names, format);
        }
        Mode::All { id } => (id, fetch_endpoints(session)?, false),
        Mode::Summary { id } => (
            id,
            SUMMARY_FIELDS.iter().map(|s| s.to_string()).collect(),
            true,
        ),
        Mode::Fields { id, fields } => (id, fields.clone(), false),
    };

    let classified = classify(&fields);
    log_debug!(
        "requesting {} field(s), {} via common-info",
        classified.includes.len(),
        classified.common_fields.len()
    );

    let mut meta = session.meta_any(id, &classified.includes)?;
    project_common_info(&mut meta, &classified)?;

    if summary && format == OutputFormat::Tabular {
        return format_summary(&meta);
    }
    serialize(&meta, format)
}

fn fetch_endpoints(session: &mut Session) -> Result<Vec<String>> {
    let names = session.list_meta_endpoints()?;
    if names.is_empty() {
        return Err(anyhow!("no metadata endpoints found"));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    // Ad-hoc parser just for testing ShowArgs in isolation.
    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        Show(ShowArgs),
    }

    fn parse(argv: &[&str]) -> ShowArgs {
        let mut full = vec!["t", "show"];
        full.extend_from_slice(argv);
        match TestCli::try_parse_from(full).unwrap().cmd {
            TestSub::Show(a) => a,
        }
    }

    fn resolve(argv: &[&str]) -> Result<Mode> {
        Mode::resolve(&parse(argv))
    }

    /// Canned store: answers one connection per body, in order, and
    /// returns the request lines it saw.
    fn fake_store(bodies: Vec<&'static str>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for body in bodies {
                let (mut sock, _) = listener.accept().unwrap();
                let mut req = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = sock.read(&mut buf).unwrap();
                    req.extend_from_slice(&buf[..n]);
                    if n == 0 || req.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&req);
                seen.push(head.lines().next().unwrap_or("").to_string());
                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                sock.write_all(resp.as_bytes()).unwrap();
            }
            seen
        });
        (format!("http://{addr}"), handle)
    }

    fn session(server_url: String) -> Session {
        Session::open(
            StoreConfig {
                server_url,
                ..Default::default()
            },
            None,
        )
        .unwrap()
    }

    /* ---- argument resolution ---- */

    #[test]
    fn bare_id_is_summary() {
        let mode = resolve(&["wordpress"]).unwrap();
        assert_eq!(
            mode,
            Mode::Summary {
                id: CharmUrl::parse("wordpress").unwrap()
            }
        );
    }

    #[test]
    fn explicit_fields() {
        let mode = resolve(&["trusty/wordpress", "charm-metadata", "perm"]).unwrap();
        match mode {
            Mode::Fields { id, fields } => {
                assert_eq!(id.path(), "trusty/wordpress");
                assert_eq!(fields, vec!["charm-metadata", "perm"]);
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn list_alone() {
        assert_eq!(resolve(&["--list"]).unwrap(), Mode::List);
    }

    #[test]
    fn all_mode() {
        assert!(matches!(resolve(&["wordpress", "--all"]).unwrap(), Mode::All { .. }));
    }

    #[test]
    fn list_rejects_id_and_all() {
        let err = resolve(&["wordpress", "--all", "--list"]).unwrap_err();
        assert_eq!(err.to_string(), "cannot specify charm or bundle with --list");

        let err = resolve(&["--all", "--list"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot specify --list and --all at the same time"
        );
    }

    #[test]
    fn missing_id() {
        let err = resolve(&[]).unwrap_err();
        assert_eq!(err.to_string(), "no charm or bundle id specified");
        assert!(resolve(&["--all"]).is_err());
    }

    #[test]
    fn all_with_fields_rejected() {
        let err = resolve(&["wordpress", "--all", "perm"]).unwrap_err();
        assert_eq!(err.to_string(), "cannot specify fields with --all");
    }

    #[test]
    fn invalid_id() {
        let err = resolve(&["Not_A_Charm"]).unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid charm or bundle id: "));
    }

    #[test]
    fn flags_parse() {
        let args = parse(&[
            "wordpress",
            "--channel",
            "edge",
            "--auth",
            "bob:pw",
            "--format",
            "json",
        ]);
        assert_eq!(args.channel.as_deref(), Some("edge"));
        assert_eq!(args.auth.unwrap().username, "bob");
        assert_eq!(args.format, OutputFormat::Json);

        let cli = TestCli::try_parse_from(["t", "show", "wordpress", "--auth", "nocolon"]);
        assert!(cli.is_err());
    }

    /* ---- end to end against a canned store ---- */

    #[test]
    fn list_mode_sorts_and_adds_common_fields() {
        let (base, handle) = fake_store(vec![r#"["id-name","archive-size"]"#]);
        let mut s = session(base);
        let out = run(&mut s, &Mode::List, OutputFormat::Yaml).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "- archive-size\n- bugs-url\n- homepage\n- id-name\n"
        );
        drop(s);
        let seen = handle.join().unwrap();
        assert_eq!(seen, vec!["GET /v5/meta/ HTTP/1.1"]);
    }

    #[test]
    fn empty_endpoint_list_is_an_error() {
        let (base, handle) = fake_store(vec!["[]"]);
        let mut s = session(base);
        let err = run(&mut s, &Mode::List, OutputFormat::Yaml).unwrap_err();
        assert_eq!(err.to_string(), "no metadata endpoints found");
        drop(s);
        handle.join().unwrap();
    }

    #[test]
    fn all_mode_projects_common_info_and_falls_back_to_yaml() {
        let (base, handle) = fake_store(vec![
            r#"["id-name","homepage"]"#,
            r#"{"Id":"cs:wordpress-1","Meta":{"id-name":{"Name":"wordpress"},"common-info":{"homepage":"https://wp"}}}"#,
        ]);
        let mut s = session(base);
        let id = CharmUrl::parse("wordpress").unwrap();

        let out = run(&mut s, &Mode::All { id }, OutputFormat::Tabular).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "homepage: https://wp\nid-name:\n  Name: wordpress\n");

        drop(s);
        let seen = handle.join().unwrap();
        assert_eq!(seen[0], "GET /v5/meta/ HTTP/1.1");
        assert_eq!(
            seen[1],
            "GET /v5/wordpress/meta/any?include=id-name&include=common-info HTTP/1.1"
        );
    }

    #[test]
    fn summary_mode_renders_table() {
        let (base, handle) = fake_store(vec![
            r#"{"Id":"cs:trusty/wordpress-3","Meta":{
                "id-revision":{"Revision":3},
                "promulgated":{"Promulgated":false},
                "owner":{"User":"bob"},
                "terms":["term1"],
                "id-name":{"Name":"wordpress"},
                "perm":{"Read":["everyone"],"Write":["bob"]},
                "published":{"Info":[{"Channel":"stable","Current":true}]},
                "charm-metadata":{"Summary":"Blog","SupportedSeries":["trusty"],"Tags":["cms"],"Subordinate":false},
                "common-info":{"homepage":"https://wp"}
            }}"#,
        ]);
        let mut s = session(base);
        let id = CharmUrl::parse("trusty/wordpress").unwrap();

        let out = run(&mut s, &Mode::Summary { id }, OutputFormat::Tabular).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Name\t"), "{text}");
        assert!(text.contains("Home page\t\thttps://wp\n"), "{text}");
        // bugs-url absent from common-info defaults to empty
        assert!(text.contains("Bugs url\t\t\n"), "{text}");
        assert!(text.contains("\tterm1\n"), "{text}");
        assert!(!text.contains("common-info"));

        drop(s);
        let seen = handle.join().unwrap();
        assert!(seen[0].contains("include=perm&include=charm-metadata"));
        assert!(seen[0].ends_with("include=id-revision&include=common-info HTTP/1.1"));
    }

    #[test]
    fn summary_mode_json_renders_projected_mapping() {
        let (base, handle) = fake_store(vec![
            r#"{"Meta":{"owner":{"User":"bob"},"common-info":{"bugs-url":"https://bugs"}}}"#,
        ]);
        let mut s = session(base);
        let id = CharmUrl::parse("wordpress").unwrap();
        let out = run(&mut s, &Mode::Summary { id }, OutputFormat::Json).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"bugs-url":"https://bugs","homepage":"","owner":{"User":"bob"}}"#
        );
        drop(s);
        handle.join().unwrap();
    }

    #[test]
    fn fields_mode_requests_exactly_the_named_fields() {
        let (base, handle) = fake_store(vec![
            r#"{"Meta":{"perm":{"Read":["everyone"],"Write":["bob"]},"common-info":{"homepage":"https://wp","bugs-url":"https://bugs"}}}"#,
        ]);
        let mut s = session(base);
        let mode = resolve(&["~bob/wordpress", "perm", "homepage"]).unwrap();
        let out = run(&mut s, &mode, OutputFormat::Json).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"homepage":"https://wp","perm":{"Read":["everyone"],"Write":["bob"]}}"#
        );

        drop(s);
        let seen = handle.join().unwrap();
        assert_eq!(
            seen,
            vec!["GET /v5/~bob/wordpress/meta/any?include=perm&include=common-info HTTP/1.1"]
        );
    }

    #[test]
    fn fields_mode_keeps_requested_common_info_and_ignores_tabular() {
        let (base, handle) = fake_store(vec![
            r#"{"Meta":{"common-info":{"bugs-url":"b","homepage":"h"}}}"#,
        ]);
        let mut s = session(base);
        let mode = resolve(&["wordpress", "common-info", "bugs-url"]).unwrap();
        let out = run(&mut s, &mode, OutputFormat::Tabular).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "bugs-url: b\ncommon-info:\n  bugs-url: b\n  homepage: h\n"
        );

        drop(s);
        let seen = handle.join().unwrap();
        assert_eq!(seen[0], "GET /v5/wordpress/meta/any?include=common-info HTTP/1.1");
    }

    #[test]
    fn summary_mode_shape_error_writes_nothing() {
        let (base, handle) = fake_store(vec![r#"{"Meta":{"id-name":{"Name":"wordpress"}}}"#]);
        let mut s = session(base);
        let id = CharmUrl::parse("wordpress").unwrap();
        let err = run(&mut s, &Mode::Summary { id }, OutputFormat::Tabular).unwrap_err();
        assert!(err.to_string().contains("owner: missing"), "{err}");
        drop(s);
        handle.join().unwrap();
    }
}
