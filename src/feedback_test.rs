use crate::feedback::*;

#[test]
fn full_row_decodes_in_order() {
    let row = parse_row(":gray_c: :gray_r: :yellow_a: :gray_n: :green_e:");

    assert_eq!(row.tuples.len(), 5);
    assert_eq!(row.blanks, 0);
    assert_eq!(row.skipped, 0);
    assert!(row.is_complete(5));

    for (i, tuple) in row.tuples.iter().enumerate() {
        assert_eq!(tuple.position, i);
    }

    assert_eq!(
        row.tuples[2],
        FeedbackTuple {
            letter: 'A',
            color: Color::Yellow,
            position: 2
        }
    );
    assert_eq!(
        row.tuples[4],
        FeedbackTuple {
            letter: 'E',
            color: Color::Green,
            position: 4
        }
    );
}

#[test]
fn platform_emoji_wrappers_are_stripped() {
    let row = parse_row("<:green_b:1111> <:green_a:2222> <:green_k:3333> <:green_e:4444> <:green_d:5555>");

    assert!(row.is_complete(5));
    let word: String = row.tuples.iter().map(|t| t.letter).collect();
    assert_eq!(word, "BAKED");
    assert!(row.tuples.iter().all(|t| t.color == Color::Green));
}

#[test]
fn adjacent_emojis_without_separators() {
    let row = parse_row("<:gray_f:1><:green_a:2><:gray_u:3><:gray_l:4><:gray_t:5>");

    assert!(row.is_complete(5));
    let word: String = row.tuples.iter().map(|t| t.letter).collect();
    assert_eq!(word, "FAULT");
}

#[test]
fn all_blank_row_is_the_start_signal() {
    let row = parse_row(":blank: :blank: :blank: :blank: :blank:");

    assert!(row.tuples.is_empty());
    assert_eq!(row.blanks, 5);
    assert!(row.is_board_reset(5));
    assert!(!row.is_complete(5));
}

#[test]
fn unknown_tokens_are_skipped_and_fail_completeness() {
    let row = parse_row(":gray_c: :purple_r: :yellow_a: :gray_n: :green_e:");

    assert_eq!(row.tuples.len(), 4);
    assert_eq!(row.skipped, 1);
    assert!(!row.is_complete(5));
}

#[test]
fn partially_filled_board_is_neither_reset_nor_complete() {
    let row = parse_row(":green_e: :blank: :blank: :blank: :blank:");

    assert_eq!(row.tuples.len(), 1);
    assert_eq!(row.blanks, 4);
    assert!(!row.is_board_reset(5));
    assert!(!row.is_complete(5));
}

#[test]
fn non_token_noise_is_skipped() {
    let row = parse_row("guess 3/6 :green_s: :green_t: :green_a: :green_r: :green_e:");

    // "guess" and "3/6" don't decode; the emoji row still comes out whole.
    assert_eq!(row.skipped, 2);
    assert_eq!(row.tuples.len(), 5);
    let word: String = row.tuples.iter().map(|t| t.letter).collect();
    assert_eq!(word, "STARE");
}

#[test]
fn empty_input_decodes_to_nothing() {
    let row = parse_row("");

    assert!(row.tuples.is_empty());
    assert_eq!(row.blanks, 0);
    assert_eq!(row.skipped, 0);
    assert!(!row.is_complete(5));
    assert!(!row.is_board_reset(5));
}
