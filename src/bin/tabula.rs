//!
//! tabula CLI binary
//! -----------------
//! Signs in, resolves a project by name and reports its permissions across
//! project, workbook, datasource, flow and metric. Without a query the whole
//! map is printed as JSON; with `--kind/--grantee/--mode` the matching grantee
//! ids are printed one per line.

use std::env;

use anyhow::{bail, Context, Result};

use tabula::directory::Projects;
use tabula::{CapabilityMode, ClientConfig, Credentials, DefaultPermissions, GranteeType, Session};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --server <url> --user <u> [--password <p>] [--site <content-url>] --project <name> [--kind <k> --grantee <users|groups> --mode <Allow|Deny>]\n\nFlags:\n  --server <url>           Server base URL (or TABULA_SERVER)\n  --site <content-url>     Site content URL; empty selects the default site\n  --user <u>               Username\n  --password <p>           Password (or TABULA_PASSWORD)\n  --project <name>         Project whose permissions are reported\n  --kind <k>               project | workbook | datasource | flow | metric\n  --grantee <t>            users | groups (default users)\n  --mode <m>               Allow | Deny (default Allow)\n  -h, --help               Show this help\n\nEnvironment:\n  TABULA_API_VERSION, TABULA_XMLNS, TABULA_TIMEOUT_MS, TABULA_ACCEPT_INVALID_CERTS\n  RUST_LOG                 log filter (default info)"
    );
}

struct Args {
    server: Option<String>,
    site: String,
    user: Option<String>,
    password: Option<String>,
    project: Option<String>,
    kind: Option<String>,
    grantee: Option<String>,
    mode: Option<String>,
}

fn parse_args(program: &str, args: &[String]) -> Args {
    let mut out = Args {
        server: None,
        site: String::new(),
        user: None,
        password: None,
        project: None,
        kind: None,
        grantee: None,
        mode: None,
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "-h" || flag == "--help" {
            print_usage(program);
            std::process::exit(0);
        }
        if i + 1 >= args.len() {
            eprintln!("{} requires a value", flag);
            print_usage(program);
            std::process::exit(2);
        }
        let value = args[i + 1].clone();
        match flag {
            "--server" => out.server = Some(value),
            "--site" => out.site = value,
            "--user" => out.user = Some(value),
            "--password" => out.password = Some(value),
            "--project" => out.project = Some(value),
            "--kind" => out.kind = Some(value),
            "--grantee" => out.grantee = Some(value),
            "--mode" => out.mode = Some(value),
            unk => {
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(program);
                std::process::exit(2);
            }
        }
        i += 2;
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut argv: Vec<String> = env::args().collect();
    let program = argv.remove(0);
    let args = parse_args(&program, &argv);

    let mut config = ClientConfig::from_env();
    if let Some(server) = args.server {
        config.server = server;
    }
    let user = args.user.context("--user is required")?;
    let password = match args.password {
        Some(p) => p,
        None => env::var("TABULA_PASSWORD").context("--password or TABULA_PASSWORD is required")?,
    };
    let project_name = args.project.context("--project is required")?;

    // validate the query before touching the network
    let query = match args.kind {
        Some(kind) => {
            let grantee: GranteeType = args.grantee.as_deref().unwrap_or("users").parse()?;
            let mode: CapabilityMode = args.mode.as_deref().unwrap_or("Allow").parse()?;
            Some((kind, grantee, mode))
        }
        None if args.grantee.is_some() || args.mode.is_some() => bail!("--grantee and --mode need --kind"),
        None => None,
    };

    let credentials = Credentials::new(user, password).with_site(args.site);
    let session = Session::sign_in(config, &credentials).await.context("sign-in failed")?;

    let outcome = report(&session, &project_name, query).await;
    let signed_out = session.sign_out().await;
    outcome?;
    signed_out.context("sign-out failed")?;
    Ok(())
}

async fn report(session: &Session, project_name: &str, query: Option<(String, GranteeType, CapabilityMode)>) -> Result<()> {
    let projects = Projects::fetch(session).await?;
    let project_id = projects.id_from_name(project_name)?;
    let snapshot = DefaultPermissions::fetch(session, project_id).await?;
    match query {
        Some((kind, grantee, mode)) => {
            for id in snapshot.query_permissions(&kind, grantee, mode)? {
                println!("{}", id);
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }
    Ok(())
}
