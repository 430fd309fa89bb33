//! Initial schema.
//!
//! - `banks`: accounts statements are downloaded from, with running balance
//! - `movements`: internal inflows and outflows, flagged once reconciled
//! - `expenses`: back-office expenses, including booked discrepancies

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Banks {
    Table,
    Id,
    Name,
    BalanceMinor,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    Kind,
    AmountMinor,
    Description,
    OccurredOn,
    Reconciled,
    ExternalReference,
    BankId,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    Description,
    AmountMinor,
    Category,
    SpentOn,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Banks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Banks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Banks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Banks::Name).string().not_null())
                    .col(
                        ColumnDef::new(Banks::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-banks-name-unique")
                    .table(Banks::Table)
                    .col(Banks::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Movements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::Description).string())
                    .col(ColumnDef::new(Movements::OccurredOn).date().not_null())
                    .col(
                        ColumnDef::new(Movements::Reconciled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Movements::ExternalReference).string())
                    .col(ColumnDef::new(Movements::BankId).uuid())
                    .col(
                        ColumnDef::new(Movements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-bank_id")
                            .from(Movements::Table, Movements::BankId)
                            .to(Banks::Table, Banks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-bank_id-reconciled")
                    .table(Movements::Table)
                    .col(Movements::BankId)
                    .col(Movements::Reconciled)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::SpentOn).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-spent_on")
                    .table(Expenses::Table)
                    .col(Expenses::SpentOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Banks::Table).to_owned())
            .await?;
        Ok(())
    }
}
