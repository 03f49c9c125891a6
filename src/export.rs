//! Rendering and export of listings.
//!
//! Order listings can be written as an aligned text table, CSV or JSON.
//! Client and food listings are only rendered as tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::models::{Client, Food, OrderRow, OutputFormat};

const ORDER_HEADER: [&str; 10] = [
    "ID",
    "Date",
    "First name",
    "Last name",
    "Address",
    "Phone number",
    "Food",
    "Quantity",
    "Color",
    "Text",
];

/// Write orders to any writer in the specified format.
pub fn write_orders<W: Write>(orders: &[OrderRow], format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Table => write_orders_table(orders, writer),
        OutputFormat::Csv => write_orders_csv(orders, writer),
        OutputFormat::Json => write_orders_json(orders, writer),
    }
}

/// Write orders to a file in the specified format.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn write_orders_to_file(orders: &[OrderRow], format: OutputFormat, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(file_path)?;
    write_orders(orders, format, BufWriter::new(file))
}

fn order_cells(order: &OrderRow) -> [String; 10] {
    [
        order.id.to_string(),
        order.date.format("%Y-%m-%d").to_string(),
        order.first_name.clone(),
        order.last_name.clone(),
        order.address.clone(),
        order.phone_number.clone(),
        order.food_name.clone(),
        order.food_quantity.to_string(),
        order.color.map(|c| c.to_string()).unwrap_or_default(),
        order.foreground().map(|f| f.to_string()).unwrap_or_default(),
    ]
}

fn write_orders_csv<W: Write>(orders: &[OrderRow], writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(ORDER_HEADER)?;

    for order in orders {
        writer.write_record(order_cells(order))?;
    }

    writer.flush()?;
    Ok(())
}

fn write_orders_json<W: Write>(orders: &[OrderRow], writer: W) -> Result<()> {
    let json_orders: Vec<serde_json::Value> = orders
        .iter()
        .map(|o| {
            serde_json::json!({
                "id": o.id,
                "date": o.date.format("%Y-%m-%d").to_string(),
                "first_name": o.first_name,
                "last_name": o.last_name,
                "address": o.address,
                "phone_number": o.phone_number,
                "food_name": o.food_name,
                "food_quantity": o.food_quantity,
                "color": o.color.map(|c| c.to_string()),
                "foreground": o.foreground(),
            })
        })
        .collect();

    serde_json::to_writer_pretty(writer, &json_orders)?;
    Ok(())
}

fn write_orders_table<W: Write>(orders: &[OrderRow], writer: W) -> Result<()> {
    let rows: Vec<Vec<String>> = orders.iter().map(|o| order_cells(o).to_vec()).collect();
    write_table(&ORDER_HEADER, &rows, writer)
}

/// Render clients as an aligned text table.
pub fn write_clients_table<W: Write>(clients: &[Client], writer: W) -> Result<()> {
    let rows: Vec<Vec<String>> = clients
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.first_name.clone(),
                c.last_name.clone(),
                c.address.clone(),
                c.phone_number.clone(),
            ]
        })
        .collect();
    write_table(&["ID", "First name", "Last name", "Address", "Phone number"], &rows, writer)
}

/// Render food items as an aligned text table.
pub fn write_food_table<W: Write>(food: &[Food], writer: W) -> Result<()> {
    let rows: Vec<Vec<String>> = food
        .iter()
        .map(|f| {
            vec![
                f.id.to_string(),
                f.food_name.clone(),
                f.color.map(|c| c.to_string()).unwrap_or_default(),
                f.foreground().map(|fg| fg.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    write_table(&["ID", "Food", "Color", "Text"], &rows, writer)
}

fn write_table<W: Write>(header: &[&str], rows: &[Vec<String>], mut writer: W) -> Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(writer, "{}", format_line(header.iter().copied(), &widths))?;
    for row in rows {
        writeln!(writer, "{}", format_line(row.iter().map(String::as_str), &widths))?;
    }

    writer.flush()?;
    Ok(())
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
