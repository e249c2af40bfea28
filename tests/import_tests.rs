use product_admin::engine::Engine;
use product_admin::error::ImportError;
use product_admin::{has_csv_extension, read_table};
use product_admin::store::{ProductStore, SqliteStore};
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::str::FromStr;
use tempfile::{tempdir, NamedTempFile};

const HEADER: &str = "product_id,product_name,category,price,quantity_sold,rating,review_count";

fn sqlite_engine(dir: &tempfile::TempDir) -> Engine<SqliteStore> {
    Engine::new(SqliteStore::open(dir.path().join("products.db")).unwrap())
}

fn import_file(engine: &Engine<SqliteStore>, content: &str) -> Result<(usize, usize), ImportError> {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(&temp_file, content).unwrap();

    let summary = engine.import_csv(File::open(temp_file.path()).unwrap())?;
    Ok((summary.created, summary.updated))
}

#[test]
fn test_read_table_keeps_line_numbers() {
    let csv_content = format!("{}\nA,a,X,1,1,4,0\n\nB,b,X,1,1,4,0\n", HEADER);

    let table = read_table(csv_content.as_bytes()).unwrap();

    assert_eq!(table.headers.len(), 7);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].line, 2);
    assert_eq!(table.rows[1].fields[0], "B");
}

#[test]
fn test_read_table_trims_cells() {
    let csv_content = " product_id , price \n  A-1 ,  3.50 \n";

    let table = read_table(csv_content.as_bytes()).unwrap();

    assert_eq!(table.headers, vec!["product_id", "price"]);
    assert_eq!(table.rows[0].fields, vec!["A-1", "3.50"]);
}

#[test]
fn test_import_into_sqlite() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    let csv_content = format!(
        "{}\nP-1,Desk lamp,Lighting,24.99,120,4.6,87\n\
         P-2,Floor lamp,Lighting,89.50,15,4.1,\n\
         P-3,Throw pillow,Decor,12,300,3.8,412\n",
        HEADER
    );

    assert_eq!(import_file(&engine, &csv_content).unwrap(), (3, 0));

    let all = engine.store().all().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].product_id, "P-2");
    assert_eq!(all[1].price, Decimal::from_str("89.50").unwrap());
    assert_eq!(all[1].review_count, 0);
    assert_eq!(all[2].price.to_string(), "12.00");
}

#[test]
fn test_second_import_only_updates() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    let csv_content = format!(
        "{}\nA,a,X,10,1,4,0\nB,b,X,,2,4,0\nC,c,Y,30,,4,0\n",
        HEADER
    );

    assert_eq!(import_file(&engine, &csv_content).unwrap(), (3, 0));
    let first = engine.store().all().unwrap();

    assert_eq!(import_file(&engine, &csv_content).unwrap(), (0, 3));
    let second = engine.store().all().unwrap();

    assert_eq!(first, second);
    assert_eq!(second[1].price, Decimal::from(20));
}

#[test]
fn test_updates_and_creates_in_same_upload() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    import_file(&engine, &format!("{}\nA,a,X,1,1,4,0\n", HEADER)).unwrap();

    let result = import_file(
        &engine,
        "category,product_id,rating,product_name,price,review_count,quantity_sold\n\
         X,A,5,renamed,2,1,8\n\
         Y,B,3,b,4,0,2\n",
    );

    assert_eq!(result.unwrap(), (1, 1));
    let snapshot = engine.store().snapshot().unwrap();
    assert_eq!(snapshot["A"].product_name, "renamed");
    assert_eq!(snapshot["A"].quantity_sold, 8);
    assert_eq!(snapshot["B"].category, "Y");
}

#[test]
fn test_missing_rating_column_persists_nothing() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    let csv_content = "product_id,product_name,category,price,quantity_sold,review_count\n\
                       A,a,X,1,1,0\n";

    let result = import_file(&engine, csv_content);

    assert!(matches!(result, Err(ImportError::Schema(_))));
    assert!(engine.store().all().unwrap().is_empty());
}

#[test]
fn test_negative_price_aborts_whole_file() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    let csv_content = format!("{}\nGOOD,g,X,5,1,4,0\nBAD,b,X,-1,1,4,0\n", HEADER);

    let result = import_file(&engine, &csv_content);

    match result {
        Err(ImportError::Validation { line, field, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(field, "price");
        }
        other => panic!("Expected Validation error, got {:?}", other),
    }
    assert!(engine.store().all().unwrap().is_empty());
}

#[test]
fn test_report_from_sqlite() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    import_file(
        &engine,
        &format!(
            "{}\nz1,Zed,Zulu,1.25,4,4,0\na1,Ace,Alpha,10,2,4,0\na2,Ant,Alpha,5,10,4,0\n",
            HEADER
        ),
    )
    .unwrap();

    let report = String::from_utf8(engine.summary_csv().unwrap()).unwrap();

    assert_eq!(
        report,
        "category,total_revenue,top_product,top_product_quantity_sold\n\
         Alpha,70.00,Ant,10\n\
         Zulu,5.00,Zed,4\n"
    );
}

#[test]
fn test_large_upload() {
    let dir = tempdir().unwrap();
    let engine = sqlite_engine(&dir);
    let mut csv_content = format!("{}\n", HEADER);
    for i in 1..=500 {
        csv_content.push_str(&format!("SKU-{:04},item {},Cat{},{}.99,{},4.0,{}\n", i, i, i % 5, i, i, i));
    }

    assert_eq!(import_file(&engine, &csv_content).unwrap(), (500, 0));

    let summaries = engine.summary().unwrap();
    assert_eq!(summaries.len(), 5);
    assert_eq!(summaries[0].category, "Cat0");
    assert_eq!(summaries[0].top_product, "item 500");
}

#[test]
fn test_csv_extension_check() {
    assert!(has_csv_extension("products.csv"));
    assert!(has_csv_extension("dir/Products.CSV"));
    assert!(!has_csv_extension("products.txt"));
    assert!(!has_csv_extension("csv"));
    assert!(!has_csv_extension(""));
}
