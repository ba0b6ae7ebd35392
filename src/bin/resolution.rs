use std::process;

use chrono::Utc;
use clap::{Arg, ArgMatches, Command};
use dotenv::dotenv;
use resolution_client::auth::{RegisterData, Session, SessionContext};
use resolution_client::error::Error;
use resolution_client::tickets::{NewTicket, Ticket, TicketId, TicketKind, TicketService, TicketStatus};
use resolution_client::verification::FlowPurpose;
use resolution_client::views::{format_date, relative_time, Dashboard, StatusPill, TicketList};
use resolution_client::Resolution;
use tracing_subscriber::EnvFilter;

fn email_arg() -> Arg<'static> {
    Arg::new("email")
        .short('e')
        .long("email")
        .value_name("EMAIL")
        .help("Account email")
        .takes_value(true)
        .required(true)
}

fn ticket_command(name: &'static str, about: &'static str) -> Command<'static> {
    let id_arg = || {
        Arg::new("id")
            .value_name("ID")
            .help("Ticket id")
            .required(true)
    };

    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List your tickets"))
        .subcommand(Command::new("show").about("Show one ticket").arg(id_arg()))
        .subcommand(
            Command::new("new")
                .about("Submit a ticket")
                .arg(
                    Arg::new("subject")
                        .short('s')
                        .long("subject")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a ticket")
                .arg(id_arg())
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Confirm the deletion"),
                ),
        )
}

fn cli() -> Command<'static> {
    Command::new("resolution")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit and track claims and requests")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("register")
                .about("Create an account and send its verification code")
                .arg(Arg::new("first_name").long("first-name").takes_value(true).required(true))
                .arg(Arg::new("last_name").long("last-name").takes_value(true).required(true))
                .arg(email_arg())
                .arg(Arg::new("password").short('p').long("password").takes_value(true).required(true))
                .arg(Arg::new("phone").long("phone").takes_value(true)),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in")
                .arg(email_arg())
                .arg(Arg::new("password").short('p').long("password").takes_value(true).required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in account"))
        .subcommand(
            Command::new("verify")
                .about("Verify an account with the emailed code")
                .arg(email_arg())
                .arg(Arg::new("code").short('c').long("code").takes_value(true).required(true)),
        )
        .subcommand(
            Command::new("resend")
                .about("Send a new verification code")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Choose a new password with an emailed code")
                .arg(email_arg())
                .arg(Arg::new("code").short('c').long("code").takes_value(true).required(true))
                .arg(Arg::new("password").short('p').long("password").takes_value(true).required(true))
                .arg(Arg::new("confirm").long("confirm").takes_value(true).required(true)),
        )
        .subcommand(ticket_command("claims", "Manage your claims"))
        .subcommand(ticket_command("requests", "Manage your requests"))
        .subcommand(Command::new("dashboard").about("Summary of your tickets"))
        .subcommand(
            Command::new("admin")
                .about("Administrator panel")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("list").about("List every ticket").arg(
                        Arg::new("kind")
                            .long("kind")
                            .takes_value(true)
                            .possible_values(["claim", "request"]),
                    ),
                )
                .subcommand(
                    Command::new("set-status")
                        .about("Change the status of a ticket")
                        .arg(
                            Arg::new("kind")
                                .value_name("KIND")
                                .possible_values(["claim", "request"])
                                .required(true),
                        )
                        .arg(Arg::new("id").value_name("ID").required(true))
                        .arg(
                            Arg::new("status")
                                .value_name("STATUS")
                                .help("Target status; defaults to the next one in the lifecycle"),
                        ),
                ),
        )
        .subcommand(Command::new("reports").about("Status statistics"))
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    matches
        .value_of(name)
        .ok_or_else(|| Error::validation(format!("falta el argumento {}", name)))
}

fn parse_id(matches: &ArgMatches) -> Result<TicketId, Error> {
    required(matches, "id")?
        .parse()
        .map_err(|_| Error::validation("El id debe ser numérico"))
}

fn parse_kind(raw: &str) -> TicketKind {
    match raw {
        "request" => TicketKind::Request,
        _ => TicketKind::Claim,
    }
}

async fn require_session(context: &SessionContext) -> Result<Session, Error> {
    context.restore().await?;
    context
        .session()
        .ok_or_else(|| Error::auth("Sesión no iniciada"))
}

fn print_ticket_row(ticket: &Ticket) {
    let pill = StatusPill::from(&ticket.status);
    let when = ticket
        .created_at
        .as_ref()
        .map(|date| relative_time(date, &Utc::now()))
        .unwrap_or_default();
    println!(
        "#{:<5} {:<12} {:<40} {}",
        ticket.id.map(|id| id.to_string()).unwrap_or_default(),
        pill.label,
        ticket.subject,
        when
    );
}

async fn run_tickets(
    service: TicketService,
    context: &SessionContext,
    matches: &ArgMatches,
) -> Result<(), Error> {
    let session = require_session(context).await?;
    let kind = service.kind();

    match matches.subcommand() {
        Some(("list", _)) => {
            let list = TicketList::load(&service, Some(session.user.id)).await;
            if let Some(error) = list.error() {
                return Err(Error::general(error));
            }
            if list.items().is_empty() {
                println!("No tienes ningún {} todavía", kind.label());
            }
            for ticket in list.items() {
                print_ticket_row(ticket);
            }
        }
        Some(("show", sub)) => {
            let ticket = service
                .get_by_id(parse_id(sub)?, Some(&session.token))
                .await?;
            println!("{}", ticket.subject);
            println!("Estado: {}", ticket.status);
            if let Some(date) = &ticket.created_at {
                println!("Fecha: {}", format_date(date));
            }
            println!();
            println!("{}", ticket.description);
        }
        Some(("new", sub)) => {
            let ticket = NewTicket::new(
                session.user.id,
                required(sub, "subject")?,
                required(sub, "description")?,
            );
            let created = service.create(&ticket).await?;
            println!(
                "{} creado con id {}",
                kind.label(),
                created.id.map(|id| id.to_string()).unwrap_or_default()
            );
        }
        Some(("delete", sub)) => {
            let id = parse_id(sub)?;
            let mut list = TicketList::load(&service, Some(session.user.id)).await;
            if let Some(error) = list.error() {
                return Err(Error::general(error));
            }
            if list.find(id).is_none() {
                return Err(Error::not_found(format!(
                    "No tienes ningún {} con id {}",
                    kind.label(),
                    id
                )));
            }
            let confirmed = sub.is_present("yes");
            if !confirmed {
                println!("Usa --yes para confirmar la eliminación");
            }
            if list.delete(&service, id, confirmed, Some(&session.token)).await {
                println!("{} {} eliminado", kind.label(), id);
            } else if let Some(error) = list.error() {
                return Err(Error::general(error));
            }
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

async fn run(resolution: Resolution, matches: ArgMatches) -> Result<(), Error> {
    let context = resolution.session();

    match matches.subcommand() {
        Some(("register", sub)) => {
            let data = RegisterData {
                first_name: required(sub, "first_name")?.to_string(),
                last_name: required(sub, "last_name")?.to_string(),
                email: required(sub, "email")?.to_string(),
                password: required(sub, "password")?.to_string(),
                phone: sub.value_of("phone").map(str::to_string),
            };
            let user = resolution.auth().register(&data).await?;
            resolution.auth().issue_code(user.id).await?;
            println!("Cuenta creada. Revisa {} para el código de verificación", user.email);
        }
        Some(("login", sub)) => {
            let user = context
                .login(required(sub, "email")?, required(sub, "password")?)
                .await?;
            println!("Bienvenido, {}", user.full_name());
        }
        Some(("logout", _)) => {
            context.logout().await?;
            println!("Sesión cerrada");
        }
        Some(("whoami", _)) => {
            let session = require_session(&context).await?;
            let user = context.refresh_user().await.unwrap_or(session.user);
            println!("{} <{}>", user.full_name(), user.email);
            if user.is_admin {
                println!("Administrador");
            }
        }
        Some(("verify", sub)) => {
            let mut flow = resolution.verification(required(sub, "email")?, FlowPurpose::VerifyAccount);
            flow.enter_code(required(sub, "code")?);
            flow.submit_code(resolution.auth()).await?;
            println!("Cuenta verificada. Ya puedes iniciar sesión");
        }
        Some(("resend", sub)) => {
            let envelope = resolution.auth().resend_code(required(sub, "email")?).await?;
            println!(
                "{}",
                envelope
                    .message
                    .unwrap_or_else(|| "Código de verificación reenviado".to_string())
            );
        }
        Some(("reset-password", sub)) => {
            let mut flow = resolution.verification(required(sub, "email")?, FlowPurpose::ResetPassword);
            flow.enter_code(required(sub, "code")?);
            flow.submit_code(resolution.auth()).await?;
            flow.set_password(
                resolution.auth(),
                required(sub, "password")?,
                required(sub, "confirm")?,
            )
            .await?;
            println!("Contraseña actualizada");
        }
        Some(("claims", sub)) => run_tickets(resolution.claims(), &context, sub).await?,
        Some(("requests", sub)) => run_tickets(resolution.requests(), &context, sub).await?,
        Some(("dashboard", _)) => {
            let session = require_session(&context).await?;
            let dashboard =
                Dashboard::load(&resolution.claims(), &resolution.requests(), Some(session.user.id))
                    .await?;

            for (kind, counts, recent) in [
                (TicketKind::Claim, &dashboard.claims, &dashboard.recent_claims),
                (TicketKind::Request, &dashboard.requests, &dashboard.recent_requests),
            ] {
                println!(
                    "{}: {} en total, {} pendientes, {} en proceso, {}% completados",
                    kind.label(),
                    counts.total,
                    counts.pending,
                    counts.in_progress,
                    counts.completed_percentage()
                );
                for ticket in recent {
                    print_ticket_row(ticket);
                }
                println!();
            }
            for action in &dashboard.quick_actions {
                println!("{} -> {}", action.title, action.link);
            }
        }
        Some(("admin", sub)) => {
            let session = require_session(&context).await?;
            let admin = resolution.admin();

            match sub.subcommand() {
                Some(("list", list)) => {
                    let data = admin.overview(&session.user, Some(&session.token)).await?;
                    let kinds = match list.value_of("kind") {
                        Some(raw) => vec![parse_kind(raw)],
                        None => vec![TicketKind::Claim, TicketKind::Request],
                    };
                    for kind in kinds {
                        println!("{} ({})", kind.label(), data.items(kind).len());
                        for item in data.items(kind) {
                            print_ticket_row(&item.ticket);
                            if let Some(info) = &item.user_info {
                                println!("       {} {} <{}>", info.first_name, info.last_name, info.email);
                            }
                        }
                    }
                }
                Some(("set-status", set)) => {
                    let kind = parse_kind(required(set, "kind")?);
                    let id = parse_id(set)?;
                    let status = match set.value_of("status") {
                        Some(raw) => TicketStatus::parse(raw),
                        None => {
                            let current = match kind {
                                TicketKind::Claim => resolution.claims(),
                                TicketKind::Request => resolution.requests(),
                            }
                            .get_by_id(id, Some(&session.token))
                            .await?
                            .status;
                            current.next().ok_or_else(|| {
                                Error::validation(format!("El estado {} es final", current))
                            })?
                        }
                    };
                    admin
                        .update_status(&session.user, Some(&session.token), kind, id, status.clone())
                        .await?;
                    println!("{} {} -> {}", kind.label(), id, status);
                }
                _ => unreachable!("subcommand_required"),
            }
        }
        Some(("reports", _)) => {
            let session = require_session(&context).await?;
            let reports = resolution
                .admin()
                .reports(&session.user, Some(&session.token))
                .await?;
            println!(
                "Periodo: {} a {}",
                reports.date_range.start_date, reports.date_range.end_date
            );
            for (kind, stats) in [
                (TicketKind::Claim, &reports.claims_stats),
                (TicketKind::Request, &reports.requests_stats),
            ] {
                let pct = stats.percentages();
                println!(
                    "{}: {} total, {}% pendiente, {}% en proceso, {}% completado",
                    kind.label(),
                    stats.total,
                    pct.pending,
                    pct.in_progress,
                    pct.completed
                );
            }
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let matches = cli().get_matches();
    let resolution = Resolution::from_env();

    if let Err(err) = run(resolution, matches).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
