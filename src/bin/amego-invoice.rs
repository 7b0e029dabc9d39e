//! amego-invoice - command-line client for the Amego e-invoice API
//!
//! Credentials come from `AMEGO_TAX_ID` and `AMEGO_APP_KEY`; see
//! [`ClientConfig::from_env`] for the optional variables.

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use amego_invoice::{
    AmegoClient, BuyerKind, CONSUMER_BUYER_ID, CONSUMER_BUYER_NAME, ClientConfig,
    InvoiceRequestBuilder, ListOptions, LogLevel, ProductItem, validate_mobile_barcode,
    validate_tax_id,
};

/// Command-line client for the Amego e-invoice API
#[derive(Parser, Debug)]
#[command(name = "amego-invoice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log requests and responses to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API is reachable with the configured credentials
    Test,

    /// Show the server time
    Time {
        #[arg(long)]
        json: bool,
    },

    /// Look up the company registered under a tax ID
    Company {
        tax_id: String,
        #[arg(long)]
        json: bool,
    },

    /// Validate a mobile barcode carrier
    Barcode {
        barcode: String,
        /// Only check the format, without calling the API
        #[arg(long)]
        local: bool,
    },

    /// Check whether an invoice won the receipt lottery
    Lottery {
        invoice_number: String,
        #[arg(long)]
        json: bool,
    },

    /// List the invoice number tracks assigned to the merchant
    Track {
        /// Period such as 11312
        #[arg(short, long)]
        period: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Validate a tax ID locally
    #[command(name = "validate-taxid")]
    ValidateTaxId { tax_id: String },

    /// Invoice operations
    #[command(subcommand)]
    Invoice(InvoiceCommand),

    /// Allowance operations
    #[command(subcommand)]
    Allowance(AllowanceCommand),
}

#[derive(Subcommand, Debug)]
enum InvoiceCommand {
    /// Issue an invoice; amounts are computed from the items
    Create(CreateArgs),

    Status {
        invoice_number: String,
        #[arg(long)]
        json: bool,
    },

    Detail {
        invoice_number: String,
        #[arg(long)]
        json: bool,
    },

    Cancel { invoice_number: String },

    List {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AllowanceCommand {
    Status {
        allowance_number: String,
        #[arg(long)]
        json: bool,
    },

    Detail {
        allowance_number: String,
        #[arg(long)]
        json: bool,
    },

    Cancel { allowance_number: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Carrier {
    /// Mobile barcode (3J0002)
    Mobile,
    /// Citizen digital certificate (CQ0001)
    Certificate,
}

#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Order ID; generated from the current time when omitted
    #[arg(long)]
    order_id: Option<String>,

    #[arg(long, default_value = CONSUMER_BUYER_ID)]
    buyer_id: String,

    #[arg(long, default_value = CONSUMER_BUYER_NAME)]
    buyer_name: String,

    #[arg(long)]
    buyer_address: Option<String>,

    #[arg(long)]
    buyer_tel: Option<String>,

    #[arg(long)]
    buyer_email: Option<String>,

    /// Line item as name:quantity:price or name:quantity:price:unit (repeatable)
    #[arg(long = "item", value_parser = parse_item)]
    items: Vec<ProductItem>,

    /// Unit prices exclude tax
    #[arg(long)]
    tax_exclusive: bool,

    #[arg(long, value_enum, requires = "carrier_id")]
    carrier: Option<Carrier>,

    #[arg(long)]
    carrier_id: Option<String>,

    /// Donation code
    #[arg(long)]
    donate: Option<String>,

    /// Main remark
    #[arg(long)]
    remark: Option<String>,

    #[arg(long)]
    json: bool,
}

fn parse_item(raw: &str) -> Result<ProductItem, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (name, quantity, price, unit) = match parts.as_slice() {
        [name, quantity, price] => (*name, *quantity, *price, None),
        [name, quantity, price, unit] => (*name, *quantity, *price, Some(*unit)),
        _ => return Err(format!("expected name:quantity:price[:unit], got '{raw}'")),
    };
    let quantity =
        Decimal::from_str(quantity).map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
    let price = Decimal::from_str(price).map_err(|e| format!("invalid price '{price}': {e}"))?;

    let item = ProductItem::new(name, quantity, price);
    Ok(match unit {
        Some(unit) if !unit.is_empty() => item.unit(unit),
        _ => item,
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "amego_invoice=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn client(verbose: bool) -> Result<AmegoClient> {
    let mut config = ClientConfig::from_env()
        .context("set AMEGO_TAX_ID and AMEGO_APP_KEY (e.g. export AMEGO_TAX_ID=12345678)")?;
    if verbose {
        config.logging.level = LogLevel::Debug;
    }
    Ok(AmegoClient::new(config)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_unix(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Test => {
            let time = client(cli.verbose)?
                .utility()
                .server_time()
                .await
                .context("API connection failed")?;
            println!("API connection OK");
            println!("  server time: {}", time.text);
            println!("  timestamp:   {}", time.timestamp);
        }
        Command::Time { json } => {
            let client = client(cli.verbose)?;
            let time = client.utility().server_time().await?;
            if json {
                return print_json(&time);
            }
            let offset = client.utility().time_offset().await?;
            println!("server time: {} ({})", time.text, time.timestamp);
            println!("offset:      {offset:+} s");
        }
        Command::Company { tax_id, json } => {
            let info = client(cli.verbose)?.utility().query_company(&tax_id).await?;
            if json {
                return print_json(&info);
            }
            match info.name {
                Some(name) if info.found => println!("{}  {}", info.tax_id, name),
                _ => println!("{}  not found", info.tax_id),
            }
        }
        Command::Barcode { barcode, local } => {
            if local {
                match validate_mobile_barcode(&barcode) {
                    Ok(()) => println!("{barcode}: format OK"),
                    Err(err) => bail!("{barcode}: {}", err.message),
                }
                return Ok(());
            }
            let result = client(cli.verbose)?
                .utility()
                .validate_barcode(&barcode)
                .await?;
            if result.valid {
                println!("{barcode}: valid");
            } else {
                bail!("{barcode}: invalid ({}: {})", result.code, result.message);
            }
        }
        Command::Lottery {
            invoice_number,
            json,
        } => {
            let status = client(cli.verbose)?
                .utility()
                .check_lottery(&invoice_number)
                .await?;
            if json {
                return print_json(&status);
            }
            match status.won {
                Some(true) => println!(
                    "{invoice_number}: won {} (prize type {})",
                    status.prize_amount.unwrap_or_default(),
                    status.prize_type.unwrap_or_default()
                ),
                Some(false) => println!("{invoice_number}: no prize"),
                None => println!("{invoice_number}: not drawn yet"),
            }
            if let Some(message) = status.message {
                println!("  {message}");
            }
        }
        Command::Track { period, json } => {
            let tracks = client(cli.verbose)?
                .utility()
                .track_info(period.as_deref())
                .await?;
            if json {
                return print_json(&tracks);
            }
            if tracks.is_empty() {
                println!("no tracks assigned");
            }
            for track in tracks {
                println!(
                    "{}  {}  {}-{}  remaining {}",
                    track.period, track.track, track.start, track.end, track.remaining
                );
            }
        }
        Command::ValidateTaxId { tax_id } => match validate_tax_id(&tax_id) {
            Ok(BuyerKind::Consumer) => println!("{tax_id}: consumer (no tax ID)"),
            Ok(BuyerKind::Business) => println!("{tax_id}: valid tax ID"),
            Err(err) => bail!("{tax_id}: {}", err.message),
        },
        Command::Invoice(command) => run_invoice(command, cli.verbose).await?,
        Command::Allowance(command) => run_allowance(command, cli.verbose).await?,
    }

    Ok(())
}

async fn run_invoice(command: InvoiceCommand, verbose: bool) -> Result<()> {
    let client = client(verbose)?;
    let invoices = client.invoice();

    match command {
        InvoiceCommand::Create(args) => {
            let order_id = args
                .order_id
                .unwrap_or_else(|| format!("CLI-{}", chrono::Utc::now().timestamp_millis()));
            let items = if args.items.is_empty() {
                vec![ProductItem::new("測試商品", Decimal::ONE, Decimal::ONE_HUNDRED)]
            } else {
                args.items
            };

            let mut builder = InvoiceRequestBuilder::new(&order_id)
                .buyer(args.buyer_id, args.buyer_name)
                .items(items)
                .price_exclusive(args.tax_exclusive);
            if let Some(address) = args.buyer_address {
                builder = builder.buyer_address(address);
            }
            if let Some(tel) = args.buyer_tel {
                builder = builder.buyer_phone(tel);
            }
            if let Some(email) = args.buyer_email {
                builder = builder.buyer_email(email);
            }
            if let (Some(carrier), Some(id)) = (args.carrier, args.carrier_id) {
                builder = match carrier {
                    Carrier::Mobile => builder.mobile_barcode(id),
                    Carrier::Certificate => builder.citizen_certificate(id),
                };
            }
            if let Some(code) = args.donate {
                builder = builder.donate(code);
            }
            if let Some(remark) = args.remark {
                builder = builder.main_remark(remark);
            }

            let request = builder.build()?;
            let result = invoices.create(&request).await?;
            if args.json {
                return print_json(&result);
            }
            println!("Invoice issued");
            println!(
                "  invoice number: {}",
                result.invoice_number.as_deref().unwrap_or("-")
            );
            println!("  order id:       {order_id}");
            println!(
                "  issued at:      {}",
                result.invoice_time.map(format_unix).unwrap_or_else(|| "-".into())
            );
            println!(
                "  random number:  {}",
                result.random_number.as_deref().unwrap_or("-")
            );
            if let Some(barcode) = result.barcode {
                println!("  barcode:        {barcode}");
            }
        }
        InvoiceCommand::Status {
            invoice_number,
            json,
        } => {
            let status = invoices.status(&invoice_number).await?;
            if json {
                return print_json(&status);
            }
            println!("{}  {:?}", status.invoice_number, status.kind);
            println!("  status: {}", status.status);
            println!("  total:  {}", status.total_amount);
        }
        InvoiceCommand::Detail {
            invoice_number,
            json,
        } => {
            let detail = invoices.detail(&invoice_number).await?;
            if json {
                return print_json(&detail);
            }
            println!("{}  {}", detail.invoice_number, format_unix(detail.invoice_time));
            println!("  buyer:  {} {}", detail.buyer_identifier, detail.buyer_name);
            println!("  seller: {} {}", detail.seller_identifier, detail.seller_name);
            println!(
                "  sales {}  tax {}  total {}",
                detail.sales_amount, detail.tax_amount, detail.total_amount
            );
            for item in &detail.items {
                println!(
                    "  - {} x{} @ {} = {}",
                    item.description, item.quantity, item.unit_price, item.amount
                );
            }
        }
        InvoiceCommand::Cancel { invoice_number } => {
            invoices.cancel(&invoice_number).await?;
            println!("{invoice_number}: cancelled");
        }
        InvoiceCommand::List {
            start,
            end,
            page,
            size,
            json,
        } => {
            let options = ListOptions {
                start_date: start,
                end_date: end,
                ..ListOptions::default()
            }
            .page(page, size);
            let list = invoices.list(&options).await?;
            if json {
                return print_json(&list);
            }
            for invoice in &list.data {
                println!(
                    "{}  {}  {:>10}  {}",
                    invoice.invoice_number,
                    format_unix(invoice.invoice_time),
                    invoice.total_amount,
                    invoice.status
                );
            }
            if let Some(total) = list.total {
                println!("{} of {total}", list.data.len());
            }
        }
    }

    Ok(())
}

async fn run_allowance(command: AllowanceCommand, verbose: bool) -> Result<()> {
    let client = client(verbose)?;
    let allowances = client.allowance();

    match command {
        AllowanceCommand::Status {
            allowance_number,
            json,
        } => {
            let status = allowances.status(&allowance_number).await?;
            if json {
                return print_json(&status);
            }
            println!("{}", status.allowance_number);
            println!("  status: {}", status.status);
            println!("  total:  {}", status.total_amount);
        }
        AllowanceCommand::Detail {
            allowance_number,
            json,
        } => {
            let detail = allowances.detail(&allowance_number).await?;
            if json {
                return print_json(&detail);
            }
            println!(
                "{}  {}",
                detail.allowance_number,
                format_unix(detail.allowance_time)
            );
            println!("  buyer: {} {}", detail.buyer_identifier, detail.buyer_name);
            println!("  tax {}  total {}", detail.tax_amount, detail.total_amount);
            for item in &detail.items {
                println!(
                    "  - {} ({}) x{} @ {} = {}",
                    item.original_description,
                    item.original_invoice_number,
                    item.quantity,
                    item.unit_price,
                    item.amount
                );
            }
        }
        AllowanceCommand::Cancel { allowance_number } => {
            allowances.cancel(&allowance_number).await?;
            println!("{allowance_number}: cancelled");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_items_with_and_without_unit() {
        let item = parse_item("Coffee:2:55").unwrap();
        assert_eq!(item.description, "Coffee");
        assert_eq!(item.amount, dec!(110));
        assert_eq!(item.unit, None);

        let item = parse_item("Tea:1.5:40:cup").unwrap();
        assert_eq!(item.unit.as_deref(), Some("cup"));
        assert_eq!(item.amount, dec!(60));
    }

    #[test]
    fn rejects_malformed_items() {
        assert!(parse_item("Coffee:2").is_err());
        assert!(parse_item("Coffee:two:55").is_err());
        assert!(parse_item("a:1:2:3:4").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_invoice_create_flags() {
        let cli = Cli::try_parse_from([
            "amego-invoice",
            "invoice",
            "create",
            "--buyer-id",
            "28080623",
            "--item",
            "Coffee:2:55",
            "--item",
            "Tea:1:40:cup",
            "--tax-exclusive",
        ])
        .unwrap();
        let Command::Invoice(InvoiceCommand::Create(args)) = cli.command else {
            panic!("expected invoice create");
        };
        assert_eq!(args.items.len(), 2);
        assert!(args.tax_exclusive);
        assert_eq!(args.buyer_name, CONSUMER_BUYER_NAME);
    }
}
