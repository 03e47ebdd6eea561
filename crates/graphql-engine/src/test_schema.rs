// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::schema::Schema;

pub(crate) const CONCERTS_SDL: &str = r#"
    enum Genre { ROCK JAZZ CLASSICAL }

    input ConcertFilter {
        title: String
        genre: Genre
    }

    type Venue {
        id: Int!
        name: String!
        published: Boolean
        concerts: [Concert!]!
    }

    type Concert {
        id: Int!
        title: String!
        genre: Genre
        venue: Venue
    }

    type Query {
        concert(id: Int!): Concert
        concerts(where: ConcertFilter, limit: Int = 10): [Concert!]!
        venue(id: Int!): Venue
        hello: String!
    }

    type Mutation {
        createConcert(title: String!): Concert!
    }
"#;

pub(crate) fn create_test_schema() -> Schema {
    Schema::from_sdl(CONCERTS_SDL).unwrap()
}
