use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use nestegg::core::{
    ContributionSpec, ContributionType, PayProfile, ProjectionPoint, ProjectionRequest,
    compute_per_paycheck, compute_projection, gross_pay,
};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement contribution calculator (per-paycheck employer match + inflation-adjusted projection)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Split one paycheck into employee contribution and employer match
    Paycheck(PaycheckArgs),
    /// Project savings to retirement in today's money, one row per quarter
    Project(ProjectArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliContributionType {
    Percentage,
    Fixed,
}

impl From<CliContributionType> for ContributionType {
    fn from(value: CliContributionType) -> Self {
        match value {
            CliContributionType::Percentage => ContributionType::Percentage,
            CliContributionType::Fixed => ContributionType::Fixed,
        }
    }
}

#[derive(Args, Debug)]
struct PaycheckArgs {
    #[arg(long, help = "Annual gross salary")]
    salary: Decimal,
    #[arg(
        long,
        default_value_t = 26,
        help = "Pay periods per year, e.g. 26 biweekly, 24 semi-monthly"
    )]
    pay_frequency: u32,
    #[arg(long = "type", value_enum, default_value_t = CliContributionType::Percentage)]
    contribution_type: CliContributionType,
    #[arg(
        long,
        help = "Percent of gross pay for --type percentage, amount per paycheck for --type fixed"
    )]
    rate: Decimal,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    #[arg(long)]
    current_age: u32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(long, default_value = "0")]
    current_savings: Decimal,
    #[arg(long)]
    annual_contribution: Decimal,
    #[arg(
        long,
        default_value = "7",
        help = "Expected annual return in percent"
    )]
    return_rate: Decimal,
    #[arg(
        long,
        default_value = "3",
        help = "Annual inflation in percent, used to express savings in today's money"
    )]
    inflation_rate: Decimal,
    #[arg(long, help = "Print the projection as JSON")]
    json: bool,
}

fn build_paycheck_inputs(args: &PaycheckArgs) -> (PayProfile, ContributionSpec) {
    (
        PayProfile {
            salary: args.salary,
            pay_frequency: args.pay_frequency,
        },
        ContributionSpec {
            kind: args.contribution_type.into(),
            rate: args.rate,
        },
    )
}

fn build_projection_request(args: &ProjectArgs) -> ProjectionRequest {
    ProjectionRequest::new(
        args.current_age,
        args.retirement_age,
        args.current_savings,
        args.annual_contribution,
    )
    .with_return_rate(args.return_rate / dec!(100))
    .with_inflation_rate(args.inflation_rate / dec!(100))
}

fn run_paycheck(args: &PaycheckArgs) -> Result<(), String> {
    let (profile, contribution) = build_paycheck_inputs(args);
    let result = compute_per_paycheck(&profile, &contribution).map_err(|e| e.to_string())?;
    let gross = gross_pay(&profile).map_err(|e| e.to_string())?;
    let total = result.total().map_err(|e| e.to_string())?;

    println!("Gross pay per period:  {gross:>12.2}");
    println!("Employee contribution: {:>12.2}", result.employee);
    println!("Employer match:        {:>12.2}", result.employer);
    println!("Total per paycheck:    {total:>12.2}");
    Ok(())
}

fn run_project(args: &ProjectArgs) -> Result<(), String> {
    let request = build_projection_request(args);
    let points = compute_projection(&request).map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&points).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }
    print_projection_table(&points);
    Ok(())
}

fn print_projection_table(points: &[ProjectionPoint]) {
    println!("{:>7} {:>8} {:>16}", "Quarter", "Age", "Savings (real)");
    println!("{}", "-".repeat(33));
    for point in points {
        println!(
            "{:>7} {:>8.2} {:>16.2}",
            point.quarter, point.age, point.savings
        );
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve { port } => nestegg::api::run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Paycheck(args) => run_paycheck(&args),
        Command::Project(args) => run_project(&args),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
