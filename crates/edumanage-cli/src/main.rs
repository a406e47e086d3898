use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Select};
use dotenvy::dotenv;
use edumanage::{
    PgPolicyStore, PolicyEvaluator, PolicyTable, Predicate, ProfileService, push_scope,
};
use edumanage_cli::report;
use edumanage_cli::seeder::{self, SeedConfig};
use edumanage_config::{DatabaseConfig, PolicyConfig};
use edumanage_db::{PgPool, init_db_pool, run_migrations};
use edumanage_models::{
    Action, ActorId, ProfileRole, ResourceClass, ResourceId, ResourceRef, Role,
};
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

#[derive(Parser)]
#[command(name = "edumanage-cli")]
#[command(about = "EduManage CLI - role profiles and access policy tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the policy table
    PolicyTable {
        /// Only show rules for this role (student, teacher, staff)
        #[arg(short = 'r', long)]
        role: Option<String>,

        /// Print rules as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an actor's role profile and extension if missing
    EnsureProfile {
        /// Actor id
        actor: ActorId,

        /// Role to provision (prompted if not provided)
        #[arg(short = 'r', long)]
        role: Option<String>,
    },
    /// Move an actor's profile to another role
    SwitchRole {
        /// Actor whose profile changes
        actor: ActorId,

        /// Role to switch to (prompted if not provided)
        #[arg(short = 'r', long)]
        role: Option<String>,

        /// Administrator performing the change
        #[arg(long = "as")]
        performed_by: ActorId,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show an actor's profile, classification and extension history
    ShowProfile {
        /// Actor id
        actor: ActorId,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decide whether an actor may act on one record
    CheckAccess {
        #[arg(long)]
        actor: ActorId,

        /// create, read, update, delete, read_collection, administer
        #[arg(long)]
        action: Action,

        /// Resource class, e.g. student or exam_result
        #[arg(long)]
        class: ResourceClass,

        /// Record id (random if omitted)
        #[arg(long)]
        id: Option<ResourceId>,

        /// Ownership column of the record, as column=<actor or extension id>; repeatable
        #[arg(long = "owner")]
        owners: Vec<String>,
    },
    /// Compile the collection scope of an actor for a resource class
    Scope {
        #[arg(long)]
        actor: ActorId,

        #[arg(long, default_value = "read_collection")]
        action: Action,

        #[arg(long)]
        class: ResourceClass,
    },
    /// Apply database migrations
    Migrate,
    /// Seed a demo school with teachers, students, courses and enrollments
    Seed {
        /// Number of teachers
        #[arg(short = 't', long, default_value = "5")]
        teachers: usize,

        /// Number of students
        #[arg(short = 's', long, default_value = "50")]
        students: usize,

        /// Courses taught by each teacher
        #[arg(long, default_value = "2")]
        courses_per_teacher: usize,

        /// Courses each student is enrolled in
        #[arg(long, default_value = "3")]
        courses_per_student: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = edumanage_observability::init_console_logging() {
        eprintln!("⚠️  Logging not initialised: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::PolicyTable { role, json } => handle_policy_table(role, json),
        Commands::EnsureProfile { actor, role } => {
            let ctx = Services::connect().await?;
            handle_ensure_profile(&ctx, actor, role).await
        }
        Commands::SwitchRole {
            actor,
            role,
            performed_by,
            yes,
        } => {
            let ctx = Services::connect().await?;
            handle_switch_role(&ctx, actor, role, performed_by, yes).await
        }
        Commands::ShowProfile { actor, json } => {
            let ctx = Services::connect().await?;
            handle_show_profile(&ctx, actor, json).await
        }
        Commands::CheckAccess {
            actor,
            action,
            class,
            id,
            owners,
        } => {
            let ctx = Services::connect().await?;
            handle_check_access(&ctx, actor, action, class, id, &owners).await
        }
        Commands::Scope {
            actor,
            action,
            class,
        } => {
            let ctx = Services::connect().await?;
            handle_scope(&ctx, actor, action, class).await
        }
        Commands::Migrate => {
            let pool = connect().await?;
            run_migrations(&pool).await?;
            println!("✅ Migrations applied");
            Ok(())
        }
        Commands::Seed {
            teachers,
            students,
            courses_per_teacher,
            courses_per_student,
        } => {
            let ctx = Services::connect().await?;
            let config = SeedConfig::new(teachers, students)
                .with_courses(courses_per_teacher, courses_per_student);
            seeder::seed_all(&ctx.pool, &ctx.profiles, config).await?;
            Ok(())
        }
    }
}

/// Services wired to one Postgres pool.
struct Services {
    pool: PgPool,
    profiles: ProfileService,
    evaluator: PolicyEvaluator,
}

impl Services {
    async fn connect() -> anyhow::Result<Self> {
        let pool = connect().await?;
        let policy = PolicyConfig::from_env();
        debug!(staff_flag_is_admin = policy.staff_flag_is_admin, "policy config loaded");

        let store = Arc::new(PgPolicyStore::new(pool.clone()));
        Ok(Self {
            profiles: ProfileService::new(store.clone()),
            evaluator: PolicyEvaluator::with_config(store, &policy),
            pool,
        })
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    init_db_pool(&DatabaseConfig::from_env())
        .await
        .context("failed to open database pool")
}

fn handle_policy_table(role: Option<String>, json: bool) -> anyhow::Result<()> {
    let role = role
        .map(|name| name.parse::<ProfileRole>().map(Role::from))
        .transpose()?;
    let table = PolicyTable::school_defaults();

    if json {
        let rules: Vec<_> = match role {
            Some(role) => table.rules_for(role).collect(),
            None => table.rules().iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if role == Some(Role::Admin) {
        println!("admin bypasses the table: every action is allowed");
        return Ok(());
    }
    for line in report::table_lines(&table, role) {
        println!("{line}");
    }
    Ok(())
}

fn prompt_role(prompt: &str) -> anyhow::Result<ProfileRole> {
    let names: Vec<&str> = ProfileRole::ALL.iter().map(|r| r.as_str()).collect();
    let choice = Select::new()
        .with_prompt(prompt)
        .items(&names)
        .default(0)
        .interact()
        .context("failed to read role")?;
    Ok(ProfileRole::ALL[choice])
}

async fn handle_ensure_profile(
    ctx: &Services,
    actor: ActorId,
    role: Option<String>,
) -> anyhow::Result<()> {
    let provisioned = match role {
        Some(name) => ctx.profiles.ensure_profile_named(actor, &name).await?,
        None => {
            let role = prompt_role("Role")?;
            ctx.profiles.ensure_profile(actor, role).await?
        }
    };

    if provisioned.changed {
        println!("\n✅ Profile created");
    } else {
        println!("\nℹ️  Profile already present");
    }
    println!("   Actor: {}", actor);
    println!("   Role: {}", provisioned.profile.role);
    if let Some(extension) = provisioned.extension {
        println!("   Business id: {}", extension.business_id);
    }
    Ok(())
}

async fn handle_switch_role(
    ctx: &Services,
    actor: ActorId,
    role: Option<String>,
    performed_by: ActorId,
    yes: bool,
) -> anyhow::Result<()> {
    let admin = ctx.profiles.load_actor(performed_by).await?;
    let decision = ctx.evaluator.can_administer(&admin, actor).await?;
    if !decision.allowed {
        bail!(
            "{} ({}) may not change role profiles: {}",
            performed_by,
            decision.role,
            decision.reason
        );
    }

    let current = ctx.profiles.profile(actor).await?;
    let role = match role {
        Some(name) => ProfileService::parse_role(&name, current.as_ref().map(|p| p.role))?,
        None => prompt_role("New role")?,
    };

    if !yes {
        let from = current
            .as_ref()
            .map(|p| p.role.to_string())
            .unwrap_or_else(|| "no profile".to_string());
        let confirmed = Confirm::new()
            .with_prompt(format!("Switch {} from {} to {}?", actor, from, role))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let switched = ctx.profiles.switch_role(actor, role).await?;
    if switched.changed {
        println!("\n✅ Role switched to {}", switched.profile.role);
    } else {
        println!("\nℹ️  Actor already holds role {}", switched.profile.role);
    }
    if let Some(extension) = switched.extension {
        println!("   Business id: {}", extension.business_id);
    }
    Ok(())
}

async fn handle_show_profile(ctx: &Services, actor: ActorId, json: bool) -> anyhow::Result<()> {
    let loaded = ctx.profiles.load_actor(actor).await?;
    let history = ctx.profiles.history(actor).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    println!("Actor: {}", actor);
    println!("Classified as: {}", ctx.evaluator.classify(&loaded));
    for line in report::history_lines(&history) {
        println!("{line}");
    }
    Ok(())
}

async fn handle_check_access(
    ctx: &Services,
    actor: ActorId,
    action: Action,
    class: ResourceClass,
    id: Option<ResourceId>,
    owners: &[String],
) -> anyhow::Result<()> {
    let loaded = ctx.profiles.load_actor(actor).await?;

    let mut record = ResourceRef::new(class, id.unwrap_or_default());
    for owner in owners {
        let (field, owner) = report::parse_owner(class, owner)?;
        record = record.with_owner(field, owner);
    }

    let decision = ctx.evaluator.can(&loaded, action, &record).await?;
    let mark = if decision.allowed { "✅ allowed" } else { "⛔ denied" };
    println!(
        "{} {} {} {}: {} ({})",
        decision.role, action, class, record.id, mark, decision.reason
    );
    if !decision.allowed && record.owners.is_empty() && class.has_owner() {
        println!("ℹ️  No --owner given; {}", report::owner_hint(class));
    }
    Ok(())
}

async fn handle_scope(
    ctx: &Services,
    actor: ActorId,
    action: Action,
    class: ResourceClass,
) -> anyhow::Result<()> {
    let loaded = ctx.profiles.load_actor(actor).await?;
    let predicate = ctx.evaluator.scope(&loaded, action, class).await?;

    // Only the WHERE fragment: most classes live in tables this crate does not own.
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("WHERE ");
    push_scope(&mut query, &predicate, "id");

    println!("{}: {}", ctx.evaluator.classify(&loaded), report::describe_predicate(&predicate));
    println!("{}", query.sql());
    if let Predicate::KeyIn { ids, .. } = &predicate {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        println!("bound ids: {}", ids.join(", "));
    }
    Ok(())
}
