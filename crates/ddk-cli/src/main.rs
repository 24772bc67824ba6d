//! ddk — DealDesk CLI.
//!
//! Thin presentation shell: parses one action, wires the catalog, overlay,
//! and controller, executes, and prints the refreshed state as key=value
//! lines. All workflow logic lives in the library crates; this file only
//! translates between the terminal and the typed core.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ddk_brief::{augment_goal, BriefAnalyzer, HeuristicAnalyzer, RemoteAnalyzer};
use ddk_catalog::{Catalog, FileSelection, SelectionProvider};
use ddk_controller::{ActionOutcome, DealController, SETTLEMENT_DELAY_MS};
use ddk_overlay::{FileBackend, Overlay};
use ddk_router::{navigate, resolve, Resolution, RouteToken};
use ddk_stagegate::GatePolicy;

#[derive(Parser)]
#[command(name = "ddk")]
#[command(about = "DealDesk — staged advertising-deal workflow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the deal's current record, stages, and control enablement
    Status,

    /// Persist the blogger chosen in the search list (stage 1)
    Select {
        /// Blogger id from the roster
        blogger_id: String,
    },

    /// Brief commands (stage 2)
    Brief {
        #[command(subcommand)]
        cmd: BriefCmd,
    },

    /// Link the outreach mailbox (stage 3)
    Email {
        /// Address in local@domain.tld form
        account: String,
    },

    /// Outreach commands (stage 4)
    Outreach {
        #[command(subcommand)]
        cmd: OutreachCmd,
    },

    /// Sign the contract (stage 5)
    Sign,

    /// Reserve/pay the campaign funds (stage 5; requires a signed contract)
    Pay,

    /// Register the uploaded draft (stage 6)
    Upload {
        /// Path or name of the draft file
        file: String,
    },

    /// Accept the published draft and queue the automatic payout (stage 7)
    Approve {
        /// Link to the published video
        #[arg(long)]
        link: String,

        /// Optional reviewer comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Request changes; reopens the shoot stage (stage 7)
    RequestFix {
        /// Link to the reviewed video
        #[arg(long, default_value = "")]
        link: String,

        /// What needs to change (required)
        #[arg(long)]
        comment: String,
    },

    /// Pay the blogger (stage 8; requires approval)
    Payout,

    /// Navigate to a route token (e.g. "5-contract"); overshoots redirect
    Goto {
        /// Route token or bare index, 1..9
        route: String,
    },

    /// Cancel the deal and wipe its stored progress
    Cancel {
        /// Acknowledge that all progress for this deal is removed
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum BriefCmd {
    /// Save the brief (all three fields required)
    Save {
        #[arg(long)]
        goal: String,

        /// Budget in whole currency units
        #[arg(long)]
        budget: u64,

        #[arg(long)]
        deadline: String,
    },

    /// Analyze the saved brief (remote endpoint when configured, offline
    /// heuristic otherwise)
    Analyze {
        /// Append the returned suggestions to the brief goal
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
}

#[derive(Subcommand)]
enum OutreachCmd {
    /// Show the planned recipient list (no state change)
    Prepare,

    /// Send the mailing
    Send,

    /// Record replies to the mailing
    Respond {
        /// Number of replies received
        count: u32,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist — production injects env vars
    // directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    let catalog = load_catalog();
    let base = catalog.primary_deal();
    let overlay = Overlay::open(FileBackend::new(overlay_path()));
    let policy = policy_from_env();
    let mut controller = DealController::new(overlay, base, policy);

    match cli.cmd {
        Commands::Status => {
            print_outcome(&controller.status());
            let rec = controller.record();
            if let Some(id) = &rec.selected_blogger_id {
                println!("blogger={}", catalog.blogger_summary(id));
            }
        }

        Commands::Select { blogger_id } => {
            let out = run(controller.select_blogger(&blogger_id))?;
            println!("blogger={}", catalog.blogger_summary(&blogger_id));
            print_outcome(&out);
        }

        Commands::Brief { cmd } => match cmd {
            BriefCmd::Save {
                goal,
                budget,
                deadline,
            } => {
                let out = run(controller.save_brief(&goal, Some(budget), &deadline))?;
                print_outcome(&out);
            }
            BriefCmd::Analyze { apply } => {
                let rec = controller.record();
                let analysis = build_analyzer()?.analyze(&rec.brief);
                println!("source={}", analysis.source);
                println!("score={}", analysis.score);
                print_list("issue", &analysis.issues);
                print_list("question", &analysis.questions);
                print_list("suggestion", &analysis.suggestions);
                print_list("idea", &analysis.ideas);
                print_list("format", &analysis.formats);

                if apply {
                    let goal = augment_goal(&rec.brief.goal, &analysis);
                    let out = run(controller.save_brief(
                        &goal,
                        rec.brief.budget,
                        &rec.brief.deadline,
                    ))?;
                    println!("goal_augmented=true");
                    print_outcome(&out);
                }
            }
        },

        Commands::Email { account } => {
            let out = run(controller.link_email(&account))?;
            print_outcome(&out);
        }

        Commands::Outreach { cmd } => match cmd {
            OutreachCmd::Prepare => {
                let picked = selection().picked();
                if picked.is_empty() {
                    println!("recipients=0");
                } else {
                    println!("recipients={}", picked.len());
                    for id in &picked {
                        println!("recipient={}", catalog.blogger_summary(id));
                    }
                }
                print_outcome(&controller.prepare_outreach());
            }
            OutreachCmd::Send => {
                let out = run(controller.send_outreach())?;
                info!("outreach mailing sent");
                print_outcome(&out);
            }
            OutreachCmd::Respond { count } => {
                let out = run(controller.record_responses(count))?;
                print_outcome(&out);
            }
        },

        Commands::Sign => {
            let out = run(controller.sign_contract())?;
            print_outcome(&out);
        }

        Commands::Pay => {
            let out = run(controller.pay())?;
            print_outcome(&out);
        }

        Commands::Upload { file } => {
            let out = run(controller.upload_draft(Some(&file)))?;
            print_outcome(&out);
        }

        Commands::Approve { link, comment } => {
            let out = run(controller.approve(&link, &comment, now_ms()))?;
            print_outcome(&out);
            settle_if_pending(&mut controller)?;
        }

        Commands::RequestFix { link, comment } => {
            let out = run(controller.request_fix(&link, &comment))?;
            info!("fix requested; shoot stage reopened");
            print_outcome(&out);
        }

        Commands::Payout => {
            let out = run(controller.payout())?;
            print_outcome(&out);
        }

        Commands::Goto { route } => {
            let requested = RouteToken::parse(&route);
            let record = controller.record();
            if let Resolution::Redirect { to } =
                resolve(requested, &record, controller.policy())
            {
                info!("route {requested} is beyond the allowed ceiling; redirecting to {to}");
            }
            let view = navigate(requested, &record, controller.policy());
            println!("route={}", view.route);
            println!("stage={}", view.stage);
            for tab in &view.tabs {
                println!(
                    "tab={}-{} active={} enabled={}",
                    tab.index, tab.slug, tab.active, tab.enabled
                );
            }
            // Rendering the payout panel re-arms the deferred settlement.
            if view.stage == ddk_stagegate::Stage::Payout {
                settle_if_pending(&mut controller)?;
            }
        }

        Commands::Cancel { yes } => {
            let out = run(controller.cancel_deal(yes))?;
            println!("cancelled=true deal_id={}", controller.deal_id());
            print_outcome(&out);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn overlay_path() -> String {
    std::env::var("DDK_OVERLAY_PATH").unwrap_or_else(|_| "ddk-overlay.json".to_string())
}

fn load_catalog() -> Catalog {
    let deals = std::env::var("DDK_DEALS_PATH").unwrap_or_else(|_| "seeds/deals.json".to_string());
    let bloggers =
        std::env::var("DDK_BLOGGERS_PATH").unwrap_or_else(|_| "seeds/bloggers.json".to_string());
    match Catalog::load(std::path::Path::new(&deals), std::path::Path::new(&bloggers)) {
        Ok(c) => c,
        Err(e) => {
            warn!("seed catalog unavailable ({e:#}); using the demo catalog");
            Catalog::demo()
        }
    }
}

fn selection() -> FileSelection {
    let path =
        std::env::var("DDK_PICKED_PATH").unwrap_or_else(|_| "seeds/picked.json".to_string());
    FileSelection::new(path)
}

fn policy_from_env() -> GatePolicy {
    match std::env::var("DDK_MIN_RESPONSES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
    {
        Some(n) if n > 0 => GatePolicy::require_responses(n),
        _ => GatePolicy::default(),
    }
}

fn build_analyzer() -> Result<Box<dyn BriefAnalyzer>> {
    match std::env::var("DDK_AI_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => {
            let remote =
                RemoteAnalyzer::new(endpoint.trim()).context("configure brief analyzer failed")?;
            Ok(Box::new(remote))
        }
        _ => Ok(Box::new(HeuristicAnalyzer)),
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Wait out the settlement delay and fire the deferred payout, if one is
/// pending for this deal: the payout completes shortly after the
/// approval-complete state is (re-)entered.
fn settle_if_pending(controller: &mut DealController<FileBackend>) -> Result<()> {
    let armed = controller.ensure_settlement_scheduled(now_ms());
    if !armed && !controller.settlements().is_scheduled(controller.deal_id()) {
        return Ok(());
    }
    info!("settlement pending; waiting {SETTLEMENT_DELAY_MS}ms");
    std::thread::sleep(std::time::Duration::from_millis(SETTLEMENT_DELAY_MS));
    if let Some(out) = run(controller.settle_due(now_ms()))? {
        info!("automatic payout settled");
        print_outcome(&out);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Convert a typed action failure into the CLI's single-line refusal.
fn run<T>(res: Result<T, ddk_controller::ActionError>) -> Result<T> {
    res.map_err(|e| anyhow::anyhow!("{e}"))
}

fn print_outcome(out: &ActionOutcome) {
    let rec = &out.record;
    println!("deal_id={}", rec.id);
    println!("title={}", rec.title);
    println!("brand={} platform={} due={}", rec.brand, rec.platform, rec.due_date);
    println!(
        "active_stage={}-{}",
        out.active_stage.index(),
        out.active_stage
    );
    println!(
        "allowed_max_stage={}-{}",
        out.allowed_max_stage.index(),
        out.allowed_max_stage
    );
    println!(
        "flags selected={} brief_complete={} email_linked={} outreach_sent={} responses={}",
        rec.selected_blogger_id.is_some(),
        rec.brief.is_complete(),
        rec.email_linked,
        rec.outreach_sent,
        rec.outreach_responses,
    );
    println!(
        "flags contract_signed={} paid={} upload_done={} approval={:?} payout_done={}",
        rec.contract_signed,
        rec.paid,
        rec.upload_done,
        rec.approval.result,
        rec.payout_done,
    );
    let c = &out.controls;
    println!(
        "controls sign={} pay={} upload={} approve={} request_fix={} payout={}",
        c.sign, c.pay, c.upload, c.approve, c.request_fix, c.payout
    );
}

fn print_list(key: &str, items: &[String]) {
    for item in items {
        println!("{key}={item}");
    }
}
