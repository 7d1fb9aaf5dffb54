use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use finplan::backend::BackendClient;
use finplan::chat::ChatSession;
use finplan::config::Config;
use finplan::domain::{EventStatus, EventType, LifeEvent, RiskProfile};
use finplan::plan::PortfolioPlan;
use finplan::selection::{CustomGoalUpdate, GoalSelection};
use finplan::sip::monthly_contribution;
use finplan::state::{Applied, ManualEvent, RecommendationContext, StateStore, Transition};
use finplan::{journal, monitoring, time};

#[derive(Parser)]
#[command(name = "finplan", about = "Life-event driven goal planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List life events (filtered by the last detection unless --all)
    Events {
        #[arg(long)]
        all: bool,
    },
    /// Record an event by hand
    AddEvent {
        #[arg(long)]
        title: String,
        /// newBaby, jobChange, wedding or homePurchase
        #[arg(long = "type", default_value = "jobChange")]
        event_type: EventType,
        #[arg(long, default_value = "")]
        explanation: String,
        #[arg(long)]
        detail: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Confirm {
        id: String,
    },
    Reject {
        id: String,
    },
    /// Show catalog goals offered for an event
    Goals {
        event_id: String,
    },
    /// Upload a bank statement (.pdf, .csv, .xlsx, .xls) for event detection
    Upload {
        file: PathBuf,
    },
    /// Submit a goal selection for a confirmed event
    Recommend {
        /// Defaults to the current event
        #[arg(long)]
        event: Option<String>,
        /// Catalog goal id to include (repeatable)
        #[arg(long = "goal")]
        goals: Vec<String>,
        /// ID=AMOUNT:YEARS, selects the goal if needed
        #[arg(long = "adjust")]
        adjustments: Vec<String>,
        /// NAME=AMOUNT:YEARS
        #[arg(long = "custom")]
        custom: Vec<String>,
        #[arg(long)]
        risk: Option<RiskProfile>,
    },
    /// Show the active plan
    Plan,
    Chat {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Monthly contribution for a target amount and horizon
    Sip {
        amount: u64,
        years: u32,
        #[arg(long)]
        rate: Option<f64>,
    },
    Health,
}

/// Parses `KEY=AMOUNT:YEARS`.
fn parse_goal_spec(raw: &str) -> Result<(String, u64, u32)> {
    let (key, rest) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=AMOUNT:YEARS, got {raw}"))?;
    let (amount, years) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("expected KEY=AMOUNT:YEARS, got {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("missing name in {raw}");
    }
    let amount = amount.trim().replace('_', "").parse::<u64>().with_context(|| format!("bad amount in {raw}"))?;
    let years = years.trim().parse::<u32>().with_context(|| format!("bad years in {raw}"))?;
    Ok((key.to_string(), amount, years))
}

fn print_events(events: &[&LifeEvent]) {
    if events.is_empty() {
        println!("no life events");
        return;
    }
    for ev in events {
        let confidence = ev
            .displayed_confidence()
            .map(|c| format!("{c}%"))
            .unwrap_or_else(|| "manual".to_string());
        println!(
            "{:<10} {:<10} {:<14} {:<28} {} ({})",
            ev.id, ev.status, ev.event_type, ev.title, ev.detected_date, confidence
        );
        println!("           {}", ev.explanation);
    }
}

fn print_plan(plan: &PortfolioPlan) {
    if plan.is_empty() {
        println!("no active goals; confirm an event and run `finplan recommend`");
        return;
    }
    println!("Total monthly SIP: {:.0}", plan.total_monthly_sip());
    for p in plan.goals() {
        let a = p.goal.allocation;
        println!(
            "- {} | target {} in {}y | SIP {} | equity {}% debt {}% gold {}% liquid {}%{}",
            p.goal.name,
            p.goal.target_amount,
            p.goal.timeframe,
            p.goal.monthly_sip,
            a.equity,
            a.debt,
            a.gold,
            a.liquid,
            if p.recommended { "" } else { " (local estimate)" }
        );
        println!("  {}", p.goal.rationale);
    }
}

async fn run(command: Command, cfg: &Config) -> Result<()> {
    let store = StateStore::new(&cfg.state_path);
    let mut planner = store.load_planner()?;
    let today = time::today(&cfg.tz)?;

    match command {
        Command::Events { all } => {
            let events: Vec<&LifeEvent> = if all {
                planner.events().iter().collect()
            } else {
                planner.displayed_events()
            };
            print_events(&events);
        }
        Command::AddEvent { title, event_type, explanation, detail, date } => {
            let id = planner
                .add_manual_event(
                    ManualEvent {
                        title,
                        event_type,
                        explanation,
                        detailed_explanation: detail,
                        detected_date: date,
                    },
                    today,
                )
                .id
                .clone();
            store.save(&planner)?;
            println!("added {id} (pending)");
        }
        Command::Confirm { id } => match planner.confirm_event(&id) {
            Transition::Applied => {
                planner.select_event(&id);
                store.save(&planner)?;
                println!("confirmed {id}; pick goals with `finplan goals {id}`");
            }
            Transition::NotFound => println!("no event {id}"),
            Transition::AlreadySettled(status) => println!("{id} is already {status}"),
        },
        Command::Reject { id } => match planner.reject_event(&id) {
            Transition::Applied => {
                store.save(&planner)?;
                println!("rejected {id}");
            }
            Transition::NotFound => println!("no event {id}"),
            Transition::AlreadySettled(status) => println!("{id} is already {status}"),
        },
        Command::Goals { event_id } => {
            let ev = planner
                .event(&event_id)
                .ok_or_else(|| anyhow!("no event {event_id}"))?;
            let selection = GoalSelection::for_event(&ev.event_type, cfg.annual_rate_pct);
            if selection.available_goals().is_empty() {
                println!("no catalog goals for {}; use --custom with `finplan recommend`", ev.event_type);
            }
            for goal in selection.available_goals() {
                let sip = monthly_contribution(goal.target_amount, goal.timeframe, cfg.annual_rate_pct)?;
                println!(
                    "{:<8} {:<28} target {:>9} in {:>2}y  SIP {:>7}",
                    goal.id, goal.name, goal.target_amount, goal.timeframe, sip
                );
            }
        }
        Command::Upload { file } => {
            let backend = BackendClient::from_config(cfg)?;
            match planner.detect_from_statement(&backend, &file, today).await? {
                Applied::Fresh(Some(ev)) => {
                    store.save(&planner)?;
                    println!("{}: {}", ev.title, ev.detailed_explanation.unwrap_or_default());
                    println!("review with `finplan confirm {}` or `finplan reject {}`", ev.id, ev.id);
                }
                Applied::Fresh(None) => println!("No clear life event detected in the statement"),
                Applied::Stale => {}
            }
        }
        Command::Recommend { event, goals, adjustments, custom, risk } => {
            let event_id = event
                .or_else(|| planner.current_event().map(|e| e.id.clone()))
                .ok_or_else(|| anyhow!("no current event; pass --event"))?;
            let ev = planner
                .select_event(&event_id)
                .ok_or_else(|| anyhow!("no event {event_id}"))?;
            if ev.status != EventStatus::Confirmed {
                bail!("event {event_id} is {}; confirm it first", ev.status);
            }

            let mut selection = GoalSelection::for_event(&ev.event_type, cfg.annual_rate_pct);
            for id in &goals {
                if !selection.is_selected(id) {
                    selection.toggle(id)?;
                }
            }
            for raw in &adjustments {
                let (id, amount, years) = parse_goal_spec(raw)?;
                if !selection.is_selected(&id) {
                    selection.toggle(&id)?;
                }
                selection.adjust(&id, amount, years)?;
            }
            for raw in &custom {
                let (name, amount, years) = parse_goal_spec(raw)?;
                let index = selection.add_custom_goal()?;
                selection.update_custom_goal(
                    index,
                    CustomGoalUpdate {
                        name: Some(name),
                        target_amount: Some(amount),
                        timeframe: Some(years),
                        rationale: None,
                    },
                )?;
            }

            let ctx = RecommendationContext {
                user_id: cfg.user_id.clone(),
                risk_profile: risk.unwrap_or(cfg.risk_profile),
                monthly_surplus: cfg.monthly_surplus,
            };
            let backend = BackendClient::from_config(cfg)?;
            if planner.submit_goal_selection(&backend, &selection, &ctx).await?.is_stale() {
                return Ok(());
            }
            store.save(&planner)?;

            if cfg.dump_predictions {
                if let Some(rec) = planner.recommendation() {
                    if let Err(err) = journal::save_prediction(&cfg.prediction_path, rec) {
                        warn!(%err, path = %cfg.prediction_path, "journal.save_prediction.failed");
                    }
                }
            }
            print_plan(&planner.plan());
        }
        Command::Plan => print_plan(&planner.plan()),
        Command::Chat { message } => {
            let backend = BackendClient::from_config(cfg)?;
            let mut session = ChatSession::default();
            if let Some(reply) = session.send(&backend, &message.join(" ")).await {
                println!("{}", reply.content);
            }
        }
        Command::Sip { amount, years, rate } => {
            let sip = monthly_contribution(amount, years, rate.unwrap_or(cfg.annual_rate_pct))?;
            println!("{sip}");
        }
        Command::Health => {
            let backend = BackendClient::from_config(cfg)?;
            println!("{}: {}", backend.base_url(), backend.health().await?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;
    monitoring::init_tracing(cfg.log_json);
    debug!(?cfg, "boot");

    run(cli.command, &cfg).await
}
