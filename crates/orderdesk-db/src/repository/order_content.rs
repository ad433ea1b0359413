//! # Order Content Repository
//!
//! Row-level access to `FK_AuftragPos` (order line items).
//!
//! Several legacy columns duplicate each other. They are all written:
//!
//! | Column                      | Value                    |
//! |-----------------------------|--------------------------|
//! | `Summen_preis`              | unit net price           |
//! | `dftArtikelpreisNetto`      | unit net price           |
//! | `dftArtikelpreisBrutto`     | unit gross price         |
//! | `Summen_*_nach_Aufrab`      | line net / tax / gross   |
//! | `Artikel_Preisfaktor`       | quantity                 |
//! | `szArtikel_Kurzbezeichnung` | product name             |

use orderdesk_core::OrderLineItem;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

const SELECT_LINE: &str = r#"
    SELECT
        lNr, AuftragsNr, AuftragsKennung, LfdNr, szPosNr, PosNr, PosText,
        ArtikelNr, WarengrpNr,
        Artikel_Bezeichnung, Artikel_Matchcode, Artikel_Einheit, Artikel_kg_Einheit,
        lArtikelID, szArtikel_Kurzbezeichnung,
        Artikel_Menge, Artikel_Preisfaktor,
        Summen_preis, dftArtikelpreisBrutto,
        Summen_netto, Summen_ust_gesamt, Summen_brutto, Summen_ust_proz,
        bMitAuftragsrabatt, fRabattWarnung,
        dftArtikel_Selbstkosten, dftSumme_GewinnNetto_NAR, dftSummen_Gewicht
    FROM FK_AuftragPos
"#;

/// Line item reads and writes on an open connection.
#[derive(Debug, Clone, Copy)]
pub struct OrderContentRepository;

impl OrderContentRepository {
    /// Inserts one line item with its pre-allocated `lNr`.
    pub async fn insert(conn: &mut SqliteConnection, line: &OrderLineItem) -> DbResult<()> {
        debug!(
            line_number = line.line_number,
            order = %line.order_number,
            position = line.position.sequence,
            product = line.product_number,
            "Inserting order line"
        );

        let snapshot = &line.product;

        sqlx::query(
            r#"
            INSERT INTO FK_AuftragPos (
                lNr, AuftragsNr, AuftragsKennung, LfdNr, szPosNr, PosNr, PosText,
                ArtikelNr, WarengrpNr,
                Artikel_Bezeichnung, Artikel_Matchcode, Artikel_Einheit, Artikel_kg_Einheit,
                Artikel_Menge, Artikel_Preisfaktor,
                Summen_preis, Summen_netto, Summen_brutto, Summen_ust_proz, Summen_ust_gesamt,
                Summen_ust_nach_Aufrab, Summen_netto_nach_Aufrab, Summen_brutto_nach_Aufrab,
                bMitAuftragsrabatt, lArtikelID, fRabattWarnung, szArtikel_Kurzbezeichnung,
                dftArtikel_Selbstkosten, dftArtikelpreisNetto, dftArtikelpreisBrutto,
                dftSumme_GewinnNetto_NAR, dftSummen_Gewicht
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?,
                ?, ?,
                ?, ?, ?, ?,
                ?, ?,
                ?, ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?
            )
            "#,
        )
        .bind(line.line_number)
        .bind(&line.order_number)
        .bind(line.order_kind)
        .bind(line.position.sequence)
        .bind(line.position.display_position)
        .bind(line.position.legacy_position)
        .bind(&line.note)
        .bind(line.product_number)
        .bind(line.goods_group)
        .bind(&snapshot.name)
        .bind(&snapshot.matchcode)
        .bind(&snapshot.unit)
        .bind(snapshot.unit_weight.to_store())
        .bind(line.quantity)
        .bind(line.price_factor)
        .bind(line.unit_net_price.to_store())
        .bind(line.total_net.to_store())
        .bind(line.total_gross.to_store())
        .bind(line.tax_rate.to_store())
        .bind(line.total_tax.to_store())
        .bind(line.total_tax.to_store())
        .bind(line.total_net.to_store())
        .bind(line.total_gross.to_store())
        .bind(line.with_order_discount)
        .bind(snapshot.product_id)
        .bind(line.discount_warning)
        .bind(&snapshot.short_name)
        .bind(line.unit_cost.to_store())
        .bind(line.unit_net_price.to_store())
        .bind(line.unit_gross_price.to_store())
        .bind(line.net_profit.to_store())
        .bind(line.weight.to_store())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Lists the lines of an order in position order.
    pub async fn list_for_order(
        conn: &mut SqliteConnection,
        order_number: &str,
    ) -> DbResult<Vec<OrderLineItem>> {
        let lines = sqlx::query_as::<_, OrderLineItem>(&format!(
            "{SELECT_LINE} WHERE AuftragsNr = ? ORDER BY LfdNr"
        ))
        .bind(order_number)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }
}
