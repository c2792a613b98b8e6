use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use planner_forms::config::PlannerConfig;
use planner_forms::decode::{decode_checked, SolverResponse, UnknownEntityPolicy};
use planner_forms::display::{print_plan, print_report, print_supplier_orders, write_plan_to_file};
use planner_forms::export::export_plan_to_csv;
use planner_forms::form::{CoursePlan, CoursePlanApp, CoursePlanForm, SupplierForm};
use planner_forms::submit::{submit, ReplayBackend};
use planner_forms::{logging, web};

#[derive(Parser)]
#[command(name = "planner-forms", about = "Build solver requests and decode solver responses")]
struct Cli {
    /// Course catalog CSV (id,name,credits,prereqs,requirement)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Prefix of solver-internal variables to ignore
    #[arg(long, global = true)]
    slack_prefix: Option<String>,

    /// zero-weight, drop or reject
    #[arg(long, global = true)]
    unknown: Option<UnknownEntityPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a recorded solver response into a semester plan
    Decode {
        #[arg(long)]
        response: PathBuf,
        #[arg(long, default_value_t = 18)]
        max_credits: u32,
        /// Also write the plan as text
        #[arg(long)]
        output: Option<PathBuf>,
        /// Append the plan to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the request payload for the course planner
    Request {
        #[arg(long, value_delimiter = ',')]
        taken: Vec<String>,
        #[arg(long, default_value_t = 8)]
        max_semesters: u32,
        #[arg(long, default_value_t = 18)]
        max_credits: u32,
    },
    /// List requirement groups still open
    Remaining {
        #[arg(long, value_delimiter = ',')]
        taken: Vec<String>,
    },
    /// Sync a supplier form and decode its solver response
    Suppliers {
        #[arg(long)]
        form: PathBuf,
        #[arg(long)]
        response: PathBuf,
    },
    /// Submit the course planner through a file-drop backend directory
    Replay {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, value_delimiter = ',')]
        taken: Vec<String>,
        #[arg(long, default_value_t = 8)]
        max_semesters: u32,
        #[arg(long, default_value_t = 18)]
        max_credits: u32,
    },
    /// Run the web server
    Web {
        #[arg(long)]
        port: Option<u16>,
    },
}

fn read_response(path: &Path) -> Result<SolverResponse, Box<dyn std::error::Error>> {
    let body = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

fn taken_set(taken: Vec<String>) -> BTreeSet<String> {
    taken
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn show_plan(plan: &CoursePlan) {
    print_plan("Course Plan", plan.rows());
    print_report(&plan.report);
    for row in plan.overloaded() {
        println!("⚠️  Semester {} exceeds {} credits", row.slot, plan.max_credits);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    let mut config = PlannerConfig::from_env()?;
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(prefix) = cli.slack_prefix {
        config.slack_prefix = prefix;
    }
    if let Some(policy) = cli.unknown {
        config.unknown_entities = policy;
    }
    let catalog = config.load_catalog()?;
    let options = config.decode_options();

    match cli.command {
        Command::Decode {
            response,
            max_credits,
            output,
            csv,
            json,
        } => {
            let response = read_response(&response)?;
            let report = decode_checked(&response, &catalog.reference_table(), &options)?;
            let plan = CoursePlan::new(report, max_credits);

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                show_plan(&plan);
            }
            if let Some(path) = output {
                write_plan_to_file("Course Plan", plan.rows(), &path)?;
                println!("Plan saved to {}", path.display());
            }
            if let Some(path) = csv {
                export_plan_to_csv(&plan, &path)?;
                println!("Plan appended to {}", path.display());
            }
        }
        Command::Request {
            taken,
            max_semesters,
            max_credits,
        } => {
            let form = CoursePlanForm {
                taken: taken_set(taken),
                max_semesters,
                max_credits,
            };
            form.validate(&catalog)?;
            println!("{}", serde_json::to_string_pretty(&form.build_request()?)?);
        }
        Command::Remaining { taken } => {
            let remaining = catalog.remaining_requirements(&taken_set(taken));
            if remaining.is_empty() {
                println!("All requirements satisfied.");
            }
            for requirement in remaining {
                println!("  - {}", requirement.options().join(" or "));
            }
        }
        Command::Suppliers { form, response } => {
            let mut form: SupplierForm = serde_json::from_str(&fs::read_to_string(form)?)?;
            form.check_limits()?;
            form.sync_suppliers();
            let response = read_response(&response)?;
            print_supplier_orders(&form.decode_orders(&response));
        }
        Command::Replay {
            dir,
            taken,
            max_semesters,
            max_credits,
        } => {
            let app = CoursePlanApp {
                catalog,
                options,
                form: CoursePlanForm {
                    taken: taken_set(taken),
                    max_semesters,
                    max_credits,
                },
            };
            let plan = submit(&app, &ReplayBackend::new(dir))?;
            show_plan(&plan);
        }
        Command::Web { port } => {
            let port = port.unwrap_or(config.port);
            println!("Access the site at http://localhost:{}", port);
            web::start_server(port, web::AppState::new(catalog, options)).await?;
        }
    }

    Ok(())
}
