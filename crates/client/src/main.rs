//! Smoke CLI: refresh the catalog and list invoices against live authorities.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    korp_observability::init();

    let config = korp_client::ClientConfig::from_env();
    tracing::info!(
        inventory = %config.inventory_url,
        invoicing = %config.invoicing_url,
        "connecting to authorities"
    );

    let (catalog, lifecycle) = korp_client::bootstrap(&config);

    let products = catalog.list().await?;
    println!("{} product(s):", products.len());
    for product in products.iter() {
        println!("  {}  {}  balance={}", product.code, product.description, product.balance);
    }

    let invoices = lifecycle.list().await?;
    println!("{} invoice(s):", invoices.len());
    for invoice in &invoices {
        println!(
            "  #{}  {:?}  {} item(s)",
            invoice.number,
            invoice.status,
            invoice.items.len()
        );
    }

    Ok(())
}
