use anyhow::{Context, Result as AnyhowResult};
use clap::{Args, Parser, Subcommand};
use euk_auth::{
    derive_permissions, landing_route, rule_table, EukGuard, Guard, GuardSession, GuardState,
    PermissionCache, PermissionGuard, PermissionResolver, Rendered, RoleGuard, StaticSession,
};
use euk_error::PermissionError;
use euk_logging::logging::setup_logging;
use euk_settings::config::EukConfig;
use euk_types::{Action, EukAction, EukSection, RequiredPermission, RouteCategory, User};
use euk_utils::color::LogColors;
use euk_utils::utils::format_epoch_millis;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Parser)]
#[command(name = "euk-guard")]
#[command(about = "Derive EUK permissions and evaluate access guards", long_about = None)]
struct Cli {
    /// Emit structured logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct UserArgs {
    /// Id of the signed in user
    #[arg(long)]
    id: i64,

    /// Role of the signed in user, e.g. ADMIN or KORISNIK
    #[arg(long)]
    role: String,

    /// Treat the account as deactivated
    #[arg(long)]
    inactive: bool,

    #[arg(long)]
    username: Option<String>,
}

impl UserArgs {
    fn to_user(&self) -> User {
        User::new(self.id, &self.role, !self.inactive)
            .with_username(self.username.as_deref().unwrap_or_default())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Derive (or load from cache) and print a user's permission set
    Permissions {
        #[command(flatten)]
        user: UserArgs,

        /// Also report whether the set opens a route category, e.g. reports
        #[arg(long, value_parser = parse_route_category)]
        category: Option<RouteCategory>,

        /// Also report whether the set allows an action, e.g. manageUsers
        #[arg(long, value_parser = parse_action)]
        action: Option<Action>,
    },
    /// Evaluate a permission guard for a route
    Check {
        #[command(flatten)]
        user: UserArgs,

        #[arg(long)]
        route: String,

        /// read, write, delete or execute
        #[arg(long, default_value = "read", value_parser = parse_permission)]
        permission: RequiredPermission,

        /// Check against another user's cached permissions
        #[arg(long)]
        for_user: Option<i64>,
    },
    /// Evaluate an EUK section guard
    Euk {
        #[command(flatten)]
        user: UserArgs,

        /// kategorije, predmeti, ugrozena-lica or stampanje
        #[arg(long, value_parser = parse_euk_section)]
        section: EukSection,

        /// read, write or delete
        #[arg(long, default_value = "read", value_parser = parse_euk_action)]
        action: EukAction,
    },
    /// Evaluate a role guard
    Role {
        #[command(flatten)]
        user: UserArgs,

        /// Comma separated list of allowed roles
        #[arg(long, value_delimiter = ',', required = true)]
        allowed: Vec<String>,
    },
    /// Print the route rule table
    Rules,
    /// Remove cached permissions for one user, or all of them
    ClearCache {
        #[arg(long)]
        id: Option<i64>,
    },
}

fn parse_permission(s: &str) -> Result<RequiredPermission, PermissionError> {
    RequiredPermission::from_str(s)
}

fn parse_route_category(s: &str) -> Result<RouteCategory, String> {
    RouteCategory::from_str(s).ok_or_else(|| format!("Unknown route category: {}", s))
}

fn parse_action(s: &str) -> Result<Action, String> {
    Action::from_str(s).ok_or_else(|| format!("Unknown action: {}", s))
}

fn parse_euk_section(s: &str) -> Result<EukSection, String> {
    EukSection::from_str(s).ok_or_else(|| format!("Unknown EUK section: {}", s))
}

fn parse_euk_action(s: &str) -> Result<EukAction, String> {
    EukAction::from_str(s).ok_or_else(|| format!("Unknown EUK action: {}", s))
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Order")]
    order: usize,

    #[tabled(rename = "Route")]
    route: String,

    #[tabled(rename = "Match")]
    matching: String,

    #[tabled(rename = "Requires")]
    requirement: String,
}

fn rule_rows() -> Vec<RuleRow> {
    rule_table()
        .iter()
        .enumerate()
        .map(|(index, entry)| RuleRow {
            order: index + 1,
            route: entry.pattern.to_string(),
            matching: format!("{:?}", entry.matching).to_lowercase(),
            requirement: entry.requirement.to_string(),
        })
        .collect()
}

fn describe(state: &GuardState) -> String {
    match state.render(|| "ALLOWED".to_string(), None) {
        Rendered::Children(text) => LogColors::green(&text),
        Rendered::Fallback(text) => text,
        Rendered::Loading => "LOADING".to_string(),
        Rendered::Denied {
            message,
            affordance,
        } => format!(
            "{} {} [{:?}]",
            LogColors::alert("DENIED"),
            message,
            affordance
        ),
    }
}

fn yes_no(granted: bool) -> String {
    if granted {
        LogColors::green("yes")
    } else {
        LogColors::alert("no")
    }
}

fn print_permissions(
    resolver: &PermissionResolver,
    user: &User,
    category: Option<RouteCategory>,
    action: Option<Action>,
) -> AnyhowResult<()> {
    let permissions = resolver
        .resolve(user, None)
        .context("Failed to resolve permissions")?;

    let json = colored_json::to_colored_json_auto(&serde_json::to_value(&permissions)?)?;
    println!("{}", json);

    if let Some(entry) = resolver.cache().get_entry(user.id) {
        println!(
            "{} {}",
            LogColors::blue("cached at:"),
            format_epoch_millis(entry.timestamp)
        );
    }
    println!(
        "{} {}",
        LogColors::blue("landing route:"),
        landing_route(user.normalized_role())
    );

    if let Some(category) = category {
        println!(
            "{} {:?}: {}",
            LogColors::blue("route category"),
            category,
            yes_no(permissions.can_access_route(category))
        );
    }
    if let Some(action) = action {
        println!(
            "{} {:?}: {}",
            LogColors::blue("action"),
            action,
            yes_no(permissions.has_action_permission(action))
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> AnyhowResult<()> {
    let config = EukConfig::default();

    if cli.verbose {
        setup_logging(config.json_logs()).context(LogColors::alert("Failed to setup logging"))?;
    }

    info!(
        "Starting {} {} in {} ({} cache)",
        config.app_name, config.app_version, config.app_env, config.cache_backend
    );

    let cache = PermissionCache::from_settings(&config.cache_settings())
        .context(LogColors::alert("Failed to setup permission cache"))?;
    let resolver = PermissionResolver::new(Arc::new(cache));

    match cli.command {
        Command::Permissions {
            user,
            category,
            action,
        } => {
            let user = user.to_user();
            // surfaces malformed users before touching the cache
            derive_permissions(Some(&user))?;
            print_permissions(&resolver, &user, category, action)?;
        }
        Command::Check {
            user,
            route,
            permission,
            for_user,
        } => {
            let session = StaticSession::new(Some(user.to_user()));
            let guard = PermissionGuard::new(resolver, &route, permission).for_user(for_user);
            let guard_session = GuardSession::new(guard);

            let state = guard_session
                .resolve(&session)
                .await
                .unwrap_or_else(|| guard_session.state());
            println!("{} ({}) -> {}", route, permission, describe(&state));
        }
        Command::Euk {
            user,
            section,
            action,
        } => {
            let guard = EukGuard::new(resolver, section, action);
            let state = guard.check(Some(&user.to_user()));
            println!("{} ({}) -> {}", section, action, describe(&state));
        }
        Command::Role { user, allowed } => {
            let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
            let guard = RoleGuard::new(&allowed);
            let state = guard.check(Some(&user.to_user()));
            println!("{}", describe(&state));
        }
        Command::Rules => {
            let mut table = Table::new(rule_rows());
            table.with(Style::sharp());
            println!("{}", table);
        }
        Command::ClearCache { id } => {
            resolver
                .invalidate(id)
                .context("Failed to clear permission cache")?;
            match id {
                Some(id) => println!("{}", LogColors::green(&format!("Cleared permissions_{}", id))),
                None => println!("{}", LogColors::green("Cleared all cached permissions")),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let cli = Cli::parse();
    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use euk_auth::DenialReason;

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from([
            "euk-guard",
            "check",
            "--id",
            "7",
            "--role",
            "KORISNIK",
            "--route",
            "/euk/predmeti",
            "--permission",
            "delete",
        ])
        .unwrap();

        match cli.command {
            Command::Check {
                user,
                route,
                permission,
                for_user,
            } => {
                assert_eq!(user.to_user(), User::new(7, "KORISNIK", true));
                assert_eq!(route, "/euk/predmeti");
                assert_eq!(permission, RequiredPermission::Delete);
                assert_eq!(for_user, None);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_permission() {
        let result = Cli::try_parse_from([
            "euk-guard",
            "check",
            "--id",
            "7",
            "--role",
            "admin",
            "--route",
            "/admin",
            "--permission",
            "approve",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_euk_command() {
        let cli = Cli::try_parse_from([
            "euk-guard",
            "euk",
            "--id",
            "7",
            "--role",
            "KORISNIK",
            "--section",
            "Ugrozena-Lica",
            "--action",
            "delete",
        ])
        .unwrap();

        match cli.command {
            Command::Euk {
                section, action, ..
            } => {
                assert_eq!(section, EukSection::UgrozenaLica);
                assert_eq!(action, EukAction::Delete);
            }
            _ => panic!("expected euk command"),
        }

        let result = Cli::try_parse_from([
            "euk-guard",
            "euk",
            "--id",
            "7",
            "--role",
            "KORISNIK",
            "--section",
            "arhiva",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_permission_queries() {
        let cli = Cli::try_parse_from([
            "euk-guard",
            "permissions",
            "--id",
            "1",
            "--role",
            "admin",
            "--category",
            "reports",
            "--action",
            "manageUsers",
        ])
        .unwrap();

        match cli.command {
            Command::Permissions {
                category, action, ..
            } => {
                assert_eq!(category, Some(RouteCategory::Reports));
                assert_eq!(action, Some(Action::ManageUsers));
            }
            _ => panic!("expected permissions command"),
        }

        assert!(parse_route_category("archive").is_err());
        assert!(parse_action("approve").is_err());
    }

    #[test]
    fn test_parse_role_list() {
        let cli = Cli::try_parse_from([
            "euk-guard",
            "role",
            "--id",
            "3",
            "--role",
            "user",
            "--inactive",
            "--allowed",
            "korisnik,user",
        ])
        .unwrap();

        match cli.command {
            Command::Role { user, allowed } => {
                assert!(!user.to_user().is_active);
                assert_eq!(allowed, vec!["korisnik".to_string(), "user".to_string()]);
            }
            _ => panic!("expected role command"),
        }
    }

    #[test]
    fn test_rule_rows() {
        let rows = rule_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].route, "/admin");
        assert_eq!(rows[4].matching, "exact");
    }

    #[test]
    fn test_describe_denied() {
        let state = GuardState::Denied(DenialReason::Unauthenticated);
        let text = describe(&state);
        assert!(text.contains("Morate biti prijavljeni"));
        assert!(text.contains("Login"));
    }
}
