//! `campus-admin` -- render one entity page of the administration API.
//!
//! ```text
//! campus-admin <resource> [page] [--parent <kind>:<id>]
//! ```
//!
//! `resource` is a collection name such as `departments` or `courses`.
//! `--parent department:d1` lists the resource scoped to that parent.
//! Connection settings come from the `CAMPUS_*` environment variables
//! described on [`ClientConfig::from_env`].

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_admin::pages::TableRow;
use campus_admin::{AdminContext, StaticSession, TracingNotifier};
use campus_client::ClientConfig;
use campus_core::models::{Course, Department, Entity, EntityKind, Semester, Session, Subject, User};
use campus_core::pagination::PageLink;
use campus_core::query::ParentScope;

struct Args {
    kind: EntityKind,
    page: u32,
    parent: Option<ParentScope>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let usage = "usage: campus-admin <resource> [page] [--parent <kind>:<id>]";
    let Some(resource) = args.next() else {
        bail!("{usage}");
    };
    let kind = EntityKind::from_name(&resource)
        .with_context(|| format!("unknown resource '{resource}'"))?;

    let mut page = 1;
    let mut parent = None;
    while let Some(arg) = args.next() {
        if arg == "--parent" {
            let value = args.next().context("--parent needs <kind>:<id>")?;
            let (parent_kind, id) = value
                .split_once(':')
                .with_context(|| format!("invalid parent '{value}', expected <kind>:<id>"))?;
            let parent_kind = EntityKind::from_name(parent_kind)
                .with_context(|| format!("unknown parent kind '{parent_kind}'"))?;
            parent = Some(ParentScope::new(parent_kind, id));
        } else {
            page = arg
                .parse()
                .with_context(|| format!("invalid page '{arg}'\n{usage}"))?;
        }
    }

    Ok(Args { kind, page, parent })
}

async fn show<E: Entity + TableRow>(ctx: &AdminContext, args: &Args) -> anyhow::Result<()> {
    let page = ctx.controller::<E>(args.parent.clone());
    page.load().await?;
    if args.page > 1 && !page.go_to(args.page).await? {
        tracing::warn!(page = args.page, "Requested page is out of range");
    }

    let view = page.view();
    println!("{}", E::columns().join(" | "));
    for item in &view.items {
        println!("{}", item.cells().join(" | "));
    }

    let window: Vec<String> = view
        .window
        .iter()
        .map(|link| match link {
            PageLink::Page { number, current: true } => format!("[{number}]"),
            PageLink::Page { number, .. } => number.to_string(),
            PageLink::Ellipsis => "...".to_string(),
        })
        .collect();
    println!();
    println!("{}", window.join(" "));
    println!("{}", view.summary);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_admin=info,campus_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config = ClientConfig::from_env()?;
    tracing::info!(api_url = %config.api_url, page_size = config.page_size, "Loaded client configuration");

    let ctx = AdminContext::from_config(
        &config,
        Arc::new(TracingNotifier),
        Arc::new(StaticSession::new(None)),
    )?;

    match args.kind {
        EntityKind::Department => show::<Department>(&ctx, &args).await,
        EntityKind::Course => show::<Course>(&ctx, &args).await,
        EntityKind::Session => show::<Session>(&ctx, &args).await,
        EntityKind::Semester => show::<Semester>(&ctx, &args).await,
        EntityKind::Subject => show::<Subject>(&ctx, &args).await,
        EntityKind::User => show::<User>(&ctx, &args).await,
    }
}
