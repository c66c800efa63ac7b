use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use shared::{
    domain::{AddressId, Notice, OrderId, OrderProductId, OrderStatus, SkuId},
    protocol::FormFields,
};
use storefront_core::{
    cancel_order, checkout_session, delete_order, toggle_wishlist, AccountInfoForm, AddressBook,
    CartAggregate, CartReconciler, CartRow, CartSnapshot, CheckoutQuote, ControlScope,
    CountryDirectory, HttpStorefront, PasswordChange, ReviewForm, Step, StorefrontApi,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Storefront page actions from the command line")]
struct Cli {
    #[arg(long, default_value = "storefront.toml")]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    /// Browser `Cookie` header; supplies both the CSRF token and the session.
    #[arg(long)]
    cookie: Option<String>,
    #[arg(long)]
    csrf_token: Option<String>,
    #[arg(long)]
    session_id: Option<String>,
    /// Cart page snapshot (JSON array of rows).
    #[arg(long)]
    snapshot: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Cart(CartCommand),
    /// Adds a product to the cart the way the product page picker does.
    AddToCart {
        sku_id: i64,
        #[arg(long, default_value_t = 1)]
        count: u32,
        #[arg(long)]
        stock: u32,
    },
    Wishlist {
        sku_id: i64,
    },
    #[command(subcommand)]
    Account(AccountCommand),
    #[command(subcommand)]
    Address(AddressCommand),
    #[command(subcommand)]
    Order(OrderCommand),
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    Show,
    Inc { sku_id: i64 },
    Dec { sku_id: i64 },
    /// Types a value into the quantity box, as raw text.
    Set { sku_id: i64, value: String },
    Remove { sku_id: i64 },
}

#[derive(ClapArgs, Debug)]
struct FieldArgs {
    /// Form field as `name=value`; repeat for every field.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

impl FieldArgs {
    fn into_form(self) -> FormFields {
        self.fields.into_iter().collect()
    }
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Update(FieldArgs),
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
enum AddressCommand {
    Create(FieldArgs),
    Update {
        addr_id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    Delete {
        addr_id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum OrderCommand {
    Cancel {
        order_id: i64,
        /// Current status code (NW, CF, ...); refused locally when not cancellable.
        #[arg(long)]
        status: Option<String>,
    },
    Delete {
        order_id: i64,
    },
    Review {
        order_product_id: i64,
        #[arg(long)]
        star: Option<i64>,
        #[arg(long, default_value = "")]
        comment: String,
    },
    Pay {
        order_id: i64,
        /// Payment session id from the order page; empty when expired.
        #[arg(long)]
        session: Option<String>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    debug!(base_url = %settings.base_url, "settings loaded");

    let api: Arc<dyn StorefrontApi> = Arc::new(
        HttpStorefront::with_timeout(
            &settings.base_url,
            settings.credentials(),
            settings.request_timeout(),
        )
        .context("failed to build storefront client")?,
    );

    match cli.command {
        Command::Cart(command) => run_cart(api, &settings, command).await,
        Command::AddToCart {
            sku_id,
            count,
            stock,
        } => add_to_cart(api, SkuId(sku_id), count, stock).await,
        Command::Wishlist { sku_id } => {
            let toggle = toggle_wishlist(api.as_ref(), SkuId(sku_id)).await;
            match toggle {
                Ok(toggle) => {
                    print_notice(&toggle.notice);
                    if let Some(count) = toggle.wish_count {
                        println!("wishlist items: {count}");
                    }
                }
                Err(err) => print_notice(&err.notice()),
            }
            Ok(())
        }
        Command::Account(command) => run_account(api.as_ref(), command).await,
        Command::Address(command) => run_address(api.as_ref(), &settings, command).await,
        Command::Order(command) => run_order(api.as_ref(), command).await,
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = &cli.base_url {
        settings.base_url = v.clone();
    }
    if let Some(v) = &cli.cookie {
        settings.apply_cookie_header(v);
    }
    if let Some(v) = &cli.csrf_token {
        settings.csrf_token = Some(v.clone());
    }
    if let Some(v) = &cli.session_id {
        settings.session_id = Some(v.clone());
    }
    if let Some(v) = &cli.snapshot {
        settings.snapshot_path = v.clone();
    }
    Ok(settings)
}

fn read_snapshot(settings: &Settings) -> Result<CartSnapshot> {
    let path = &settings.snapshot_path;
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read cart snapshot '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid cart snapshot '{}'", path.display()))
}

fn write_snapshot(settings: &Settings, snapshot: &CartSnapshot) -> Result<()> {
    let path = &settings.snapshot_path;
    let raw = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, raw)
        .with_context(|| format!("failed to write cart snapshot '{}'", path.display()))?;
    Ok(())
}

async fn run_cart(api: Arc<dyn StorefrontApi>, settings: &Settings, command: CartCommand) -> Result<()> {
    let snapshot = read_snapshot(settings)?;
    let cart = CartReconciler::new(api, &snapshot, ControlScope::CartRow);

    let notice = match command {
        CartCommand::Show => None,
        CartCommand::Inc { sku_id } => cart.step(SkuId(sku_id), Step::Increment).await?.notice(),
        CartCommand::Dec { sku_id } => cart.step(SkuId(sku_id), Step::Decrement).await?.notice(),
        CartCommand::Set { sku_id, value } => {
            cart.focus(SkuId(sku_id)).await?;
            cart.blur(SkuId(sku_id), &value).await?.notice()
        }
        CartCommand::Remove { sku_id } => cart.remove(SkuId(sku_id)).await?.notice(),
    };
    if let Some(notice) = notice {
        print_notice(&notice);
    }

    let after = cart.snapshot().await;
    print_cart(after.rows(), &cart.aggregate().await, &cart.checkout_quote().await);
    if after != snapshot {
        write_snapshot(settings, &after)?;
        info!(path = %settings.snapshot_path.display(), "cart snapshot updated");
    }
    Ok(())
}

async fn add_to_cart(api: Arc<dyn StorefrontApi>, sku_id: SkuId, count: u32, stock: u32) -> Result<()> {
    let picker = CartSnapshot::new(vec![CartRow {
        sku_id,
        quantity: 1,
        unit_price: 0,
        stock,
    }])?;
    let picker = CartReconciler::new(api, &picker, ControlScope::ProductPicker);

    picker.focus(sku_id).await?;
    let outcome = picker.blur(sku_id, &count.to_string()).await?;
    if let Some(notice) = outcome.notice() {
        print_notice(&notice);
        return Ok(());
    }

    let added = picker.add_to_cart(sku_id).await?;
    print_notice(&added.notice);
    if let Some(count) = added.cart_count {
        println!("cart items: {count}");
    }
    Ok(())
}

async fn run_account(api: &dyn StorefrontApi, command: AccountCommand) -> Result<()> {
    let result = match command {
        AccountCommand::Update(fields) => {
            let mut form = AccountInfoForm::new(FormFields::new());
            form.begin_edit();
            for (name, value) in fields.into_form() {
                form.set_field(name, value)?;
            }
            form.submit(api).await
        }
        AccountCommand::Password {
            current,
            new,
            confirm,
        } => PasswordChange::new(current, new, confirm).submit(api).await,
    };
    report(result);
    Ok(())
}

async fn run_address(api: &dyn StorefrontApi, settings: &Settings, command: AddressCommand) -> Result<()> {
    let result = match command {
        AddressCommand::Create(fields) => {
            let mut book = AddressBook::new(Vec::new(), CountryDirectory::default());
            book.create(api, fields.into_form()).await
        }
        AddressCommand::Update { addr_id, fields } => {
            let countries = CountryDirectory::load(&settings.countries_path)?;
            let mut book = AddressBook::new(Vec::new(), countries);
            book.update(api, AddressId(addr_id), fields.into_form()).await
        }
        AddressCommand::Delete { addr_id } => {
            let mut book = AddressBook::new(Vec::new(), CountryDirectory::default());
            book.delete(api, AddressId(addr_id)).await
        }
    };
    report(result);
    Ok(())
}

async fn run_order(api: &dyn StorefrontApi, command: OrderCommand) -> Result<()> {
    match command {
        OrderCommand::Cancel { order_id, status } => {
            let status = match status.as_deref() {
                Some(code) => match OrderStatus::from_code(code) {
                    Some(status) => Some(status),
                    None => bail!("unknown order status '{code}'"),
                },
                None => None,
            };
            report(cancel_order(api, OrderId(order_id), status).await);
        }
        OrderCommand::Delete { order_id } => report(delete_order(api, OrderId(order_id)).await),
        OrderCommand::Review {
            order_product_id,
            star,
            comment,
        } => {
            let mut form = ReviewForm::new(OrderProductId(order_product_id));
            report(form.submit(api, star, &comment).await);
        }
        OrderCommand::Pay { order_id, session } => {
            match checkout_session(api, OrderId(order_id), session.as_deref()).await {
                Ok(id) => println!("checkout session: {id}"),
                Err(err) => print_notice(&err.notice()),
            }
        }
    }
    Ok(())
}

fn report(result: Result<Notice, storefront_core::ActionError>) {
    match result {
        Ok(notice) => print_notice(&notice),
        Err(err) => print_notice(&err.notice()),
    }
}

fn print_notice(notice: &Notice) {
    println!("{notice}");
}

fn print_cart(rows: &[CartRow], aggregate: &CartAggregate, quote: &CheckoutQuote) {
    for row in rows {
        let line = aggregate.line_total(row.sku_id).unwrap_or_default();
        println!(
            "sku {:>6}  qty {:>3}/{:<3}  @ {:>8}  = {:>10}",
            row.sku_id.0, row.quantity, row.stock, row.unit_price, line
        );
    }
    println!("items: {}  lines: {}", aggregate.total_count, aggregate.cart_count);
    println!("subtotal: {}", aggregate.subtotal);
    println!("{}", shipping_line(quote));
    println!("total: {}", quote.total_price);
}

fn shipping_line(quote: &CheckoutQuote) -> String {
    if quote.ships_free() {
        "shipping: free".to_string()
    } else {
        format!("shipping: {}", quote.shipping_fee)
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
