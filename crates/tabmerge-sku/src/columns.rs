//! Destination column list and insert statement

/// Table the loader writes to unless told otherwise
pub const DEFAULT_TABLE: &str = "sku";

/// Destination columns, in the order workbook values are bound
pub const SKU_COLUMNS: [&str; 62] = [
    "company_id",
    "div_id",
    "depot_id",
    "sku_code",
    "sku_description",
    "sku_base_price",
    "sku_case_size",
    "sku_preference",
    "microname",
    "brand_id",
    "pack",
    "varient",
    "volume",
    "crs_code",
    "crs_code_description",
    "crs_code_case_size",
    "comments",
    "active",
    "created",
    "created_by",
    "modified",
    "modified_by",
    "version",
    "compcode",
    "cat_gp_code",
    "cat_gp_desc",
    "cat_code",
    "cat_desc",
    "sku_size",
    "sku_uom",
    "pr_clas",
    "prod_size",
    "base_code",
    "micro_code",
    "available",
    "channel_id",
    "material_grade",
    "child",
    "multiple",
    "hsn_code",
    "batch",
    "is_combi",
    "mgf_date",
    "expiry_date",
    "parent_code",
    "cgst_per",
    "igst_per",
    "sgst_per",
    "ean_code",
    "stock_cover_day",
    "segment_id",
    "segment_name",
    "price_grp",
    "pro_npr_indicator",
    "micro_brand",
    "is_child",
    "is_npd",
    "micro_name_cd",
    "is_split",
    "cpc",
    "variant",
    "div_name",
];

/// Build the positional `INSERT` for `table`.
///
/// The table name is quoted as an identifier; the column names are fixed.
pub fn insert_sql(table: &str) -> String {
    let columns = SKU_COLUMNS.join(", ");
    let params = (1..=SKU_COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns,
        params
    )
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_list() {
        assert_eq!(SKU_COLUMNS.len(), 62);
        assert_eq!(SKU_COLUMNS[0], "company_id");
        assert_eq!(SKU_COLUMNS[61], "div_name");
        let mut sorted = SKU_COLUMNS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 62);
    }

    #[test]
    fn test_insert_sql() {
        let sql = insert_sql("sku");
        assert!(sql.starts_with("INSERT INTO \"sku\" (company_id, div_id, "));
        assert!(sql.ends_with("?61, ?62)"));
        assert_eq!(sql.matches('?').count(), 62);
    }

    #[test]
    fn test_table_name_is_quoted() {
        assert!(insert_sql("we\"ird").starts_with("INSERT INTO \"we\"\"ird\" ("));
    }
}
